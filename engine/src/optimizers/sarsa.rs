//! # SARSA (§4.8)
//!
//! On-policy tabular TD control: identical scaffolding to [`super::ql`], but the backup target
//! is the Q-value of the action the epsilon-greedy policy will actually take next rather than
//! the greedy max. See [`super::td`] for the shared training loop.

use crate::config::TdLearningParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::Weights;
use crate::result::{OptResult, Seed};

use super::td::{self, Variant};
use super::{CancelFlag, Optimizer, ProgressCallback};

/// The SARSA optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sarsa {
    params: TdLearningParams,
}

impl Sarsa {
    /// Build with explicit parameters.
    pub fn new(params: TdLearningParams) -> Self {
        Sarsa { params }
    }
}

impl Optimizer for Sarsa {
    fn name(&self) -> &'static str {
        "SARSA"
    }

    fn optimize(
        &self,
        graph: &Graph,
        source: NodeId,
        destination: NodeId,
        weights: Weights,
        bandwidth_demand: f64,
        seed: Seed,
        progress_cb: Option<&mut ProgressCallback>,
        cancel: Option<&CancelFlag>,
    ) -> Result<OptResult, Error> {
        td::run(
            Variant::Sarsa,
            &self.params,
            graph,
            source,
            destination,
            weights,
            bandwidth_demand,
            seed,
            progress_cb,
            cancel,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};

    fn line_graph(n: u32) -> Graph {
        let mut b = Graph::builder();
        for i in 0..n {
            b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        }
        for i in 0..n - 1 {
            b = b.add_edge(i, i + 1, EdgeData { bandwidth: 500.0, link_delay: 10.0, link_reliability: 0.99 });
        }
        b.build().unwrap()
    }

    #[test]
    fn sarsa_finds_the_only_path_on_a_line_graph() {
        let g = line_graph(5);
        let sarsa = Sarsa::new(TdLearningParams { episodes: 300, ..Default::default() });
        let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
        let result = sarsa.optimize(&g, 0, 4, weights, 0.0, 1, None, None).unwrap();
        assert!(result.success);
        assert_eq!(result.path, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sarsa_is_deterministic_for_a_fixed_seed() {
        let g = line_graph(6);
        let sarsa = Sarsa::new(TdLearningParams { episodes: 300, ..Default::default() });
        let weights = Weights { delay: 0.3, reliability: 0.4, resource: 0.3 };
        let r1 = sarsa.optimize(&g, 0, 5, weights, 0.0, 4, None, None).unwrap();
        let r2 = sarsa.optimize(&g, 0, 5, weights, 0.0, 4, None, None).unwrap();
        assert_eq!(r1.path, r2.path);
    }
}
