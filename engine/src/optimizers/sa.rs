//! # Simulated Annealing (§4.6)
//!
//! Starts from the best of a handful of deterministic and randomized seed paths, then repeatedly
//! perturbs the current path with a node-replacement neighbor operator (falling back to node
//! insertion), accepting worsening moves with Metropolis probability `exp(-delta/T)` while `T`
//! cools geometrically.

use std::time::Instant;

use rand::Rng;

use crate::config::SaParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::pathutil::{cached_shortest_path, guided_random_walk, max_walk_len, uniform_random_walk, WeightScheme};
use crate::result::{OptResult, Seed};
use crate::rng::rng_from_seed;

use super::common::{node_insertion, node_replacement};
use super::{common_precheck, finish_success, report_progress, CancelFlag, Optimizer, Progress, ProgressCallback};

/// The Simulated Annealing optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAnnealing {
    params: SaParams,
}

impl SimulatedAnnealing {
    /// Build with explicit parameters.
    pub fn new(params: SaParams) -> Self {
        SimulatedAnnealing { params }
    }

    fn neighbor(&self, graph: &Graph, path: &[NodeId], bandwidth: f64, rng: &mut impl Rng) -> Option<Vec<NodeId>> {
        for _ in 0..self.params.neighbor_retries {
            if let Some(p) = node_replacement(graph, path, bandwidth, rng) {
                return Some(p);
            }
            if let Some(p) = node_insertion(graph, path, bandwidth, rng) {
                return Some(p);
            }
        }
        None
    }
}

impl Optimizer for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "SA"
    }

    fn optimize(
        &self,
        graph: &Graph,
        source: NodeId,
        destination: NodeId,
        weights: Weights,
        bandwidth_demand: f64,
        seed: Seed,
        mut progress_cb: Option<&mut ProgressCallback>,
        cancel: Option<&CancelFlag>,
    ) -> Result<OptResult, Error> {
        let start = Instant::now();
        if let Some(result) = common_precheck(graph, source, destination, weights, bandwidth_demand, seed, start)? {
            return Ok(result);
        }

        let mut rng = rng_from_seed(seed);
        let node_count = graph.node_count();
        let max_len = max_walk_len(node_count, node_count / 2);

        let mut candidates: Vec<Vec<NodeId>> = Vec::new();
        if let Some(p) = cached_shortest_path(graph, source, destination, bandwidth_demand, WeightScheme::Hops) {
            candidates.push(p);
        }
        if let Some(p) = guided_random_walk(graph, source, destination, bandwidth_demand, max_len, &mut rng) {
            candidates.push(p);
        }
        for _ in 0..5 {
            if let Some(p) = uniform_random_walk(graph, source, destination, bandwidth_demand, max_len, &mut rng) {
                candidates.push(p);
            }
        }

        if candidates.is_empty() {
            return Ok(OptResult::failure(
                crate::error::FailureReason::NoPath,
                seed,
                start.elapsed().as_secs_f64() * 1000.0,
            ));
        }

        let mut current = candidates
            .into_iter()
            .min_by(|a, b| {
                let ca = evaluate(graph, a, weights, bandwidth_demand).1;
                let cb = evaluate(graph, b, weights, bandwidth_demand).1;
                ca.partial_cmp(&cb).unwrap()
            })
            .unwrap();
        let mut current_cost = evaluate(graph, &current, weights, bandwidth_demand).1;

        let mut best = current.clone();
        let mut best_cost = current_cost;
        let mut best_step: u64 = 0;

        let mut temperature = self.params.t_init;
        let mut step: u64 = 0;

        while temperature > self.params.t_final {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                break;
            }
            for _ in 0..self.params.iterations_per_temp {
                step += 1;
                if let Some(candidate) = self.neighbor(graph, &current, bandwidth_demand, &mut rng) {
                    let (_, candidate_cost, _) = evaluate(graph, &candidate, weights, bandwidth_demand);
                    let delta = candidate_cost - current_cost;
                    let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();
                    if accept {
                        current = candidate;
                        current_cost = candidate_cost;
                        if current_cost < best_cost {
                            best_cost = current_cost;
                            best = current.clone();
                            best_step = step;
                        }
                    }
                }
            }
            report_progress(&mut progress_cb, Progress { step, best_cost });
            temperature *= self.params.cooling_factor;
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(finish_success(graph, best, weights, bandwidth_demand, seed, elapsed_ms, best_step))
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
    fn sa_finds_the_only_path_on_a_line_graph() {
        let g = line_graph(5);
        let sa = SimulatedAnnealing::default();
        let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
        let result = sa.optimize(&g, 0, 4, weights, 0.0, 2, None, None).unwrap();
        assert!(result.success);
        assert_eq!(result.path, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sa_is_deterministic_for_a_fixed_seed() {
        let g = line_graph(6);
        let sa = SimulatedAnnealing::default();
        let weights = Weights { delay: 0.2, reliability: 0.4, resource: 0.4 };
        let r1 = sa.optimize(&g, 0, 5, weights, 0.0, 5, None, None).unwrap();
        let r2 = sa.optimize(&g, 0, 5, weights, 0.0, 5, None, None).unwrap();
        assert_eq!(r1.path, r2.path);
    }
}
