//! # Ant Colony Optimization (§4.4)
//!
//! A colony of ants builds paths edge-by-edge, biased by a pheromone table and a delay-based
//! heuristic; pheromone evaporates and is redeposited each iteration in proportion to path
//! quality. `alpha`/`beta` drift linearly from exploration towards exploitation across
//! iterations.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::config::AcoParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::result::{OptResult, Seed};
use crate::rng::rng_from_seed;

use super::{common_precheck, finish_success, report_progress, CancelFlag, Optimizer, Progress, ProgressCallback};

const EPSILON: f64 = 1e-6;

type EdgeKey = (NodeId, NodeId);

fn edge_key(u: NodeId, v: NodeId) -> EdgeKey {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

/// The Ant Colony Optimization optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntColony {
    params: AcoParams,
}

impl AntColony {
    /// Build with explicit parameters.
    pub fn new(params: AcoParams) -> Self {
        AntColony { params }
    }

    fn construct_ant(
        &self,
        graph: &Graph,
        s: NodeId,
        d: NodeId,
        bandwidth: f64,
        pheromone: &HashMap<EdgeKey, f64>,
        alpha: f64,
        beta: f64,
        rng: &mut impl Rng,
    ) -> Option<Vec<NodeId>> {
        let max_len = 2 * graph.node_count();
        let mut path = vec![s];
        let mut current = s;
        while current != d {
            if path.len() > max_len {
                return None;
            }
            let allowed: Vec<NodeId> = graph
                .neighbors(current)
                .iter()
                .copied()
                .filter(|v| !path.contains(v))
                .filter(|&v| {
                    graph
                        .edge(current, v)
                        .map(|e| bandwidth <= 0.0 || e.bandwidth >= bandwidth)
                        .unwrap_or(false)
                })
                .collect();
            if allowed.is_empty() {
                return None;
            }
            let weights: Vec<f64> = allowed
                .iter()
                .map(|&v| {
                    let tau = *pheromone.get(&edge_key(current, v)).unwrap_or(&1.0);
                    let delay = graph.edge(current, v).map(|e| e.link_delay).unwrap_or(1.0);
                    let eta = 1.0 / (delay + EPSILON);
                    tau.powf(alpha) * eta.powf(beta)
                })
                .collect();
            let total: f64 = weights.iter().sum();
            let next = if total <= 0.0 || !total.is_finite() {
                allowed[rng.gen_range(0..allowed.len())]
            } else {
                let mut r = rng.gen::<f64>() * total;
                let mut chosen = allowed[allowed.len() - 1];
                for (i, &w) in weights.iter().enumerate() {
                    if r < w {
                        chosen = allowed[i];
                        break;
                    }
                    r -= w;
                }
                chosen
            };
            path.push(next);
            current = next;
        }
        Some(path)
    }
}

impl Optimizer for AntColony {
    fn name(&self) -> &'static str {
        "ACO"
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
        let mut pheromone: HashMap<EdgeKey, f64> = graph.edges().map(|(u, v, _)| (edge_key(u, v), 1.0)).collect();

        let mut best_path: Option<Vec<NodeId>> = None;
        let mut best_cost = f64::INFINITY;
        let mut best_iteration: u64 = 0;
        let mut stagnant: u64 = 0;

        for iteration in 0..self.params.max_iterations {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                break;
            }

            let progress_frac = iteration as f64 / self.params.max_iterations.max(1) as f64;
            let alpha = self.params.alpha + 0.5 * self.params.alpha * progress_frac;
            let beta = (self.params.beta * (1.0 - 0.5 * progress_frac)).max(0.1);

            let mut iter_paths: Vec<(Vec<NodeId>, f64)> = Vec::with_capacity(self.params.n_ants);
            for _ in 0..self.params.n_ants {
                if let Some(path) = self.construct_ant(graph, source, destination, bandwidth_demand, &pheromone, alpha, beta, &mut rng) {
                    let (_, cost, _) = evaluate(graph, &path, weights, bandwidth_demand);
                    if cost.is_finite() {
                        iter_paths.push((path, cost));
                    }
                }
            }

            for v in pheromone.values_mut() {
                *v *= 1.0 - self.params.evaporation;
            }
            for (path, cost) in &iter_paths {
                let deposit = self.params.deposit / cost.max(EPSILON);
                for w in path.windows(2) {
                    *pheromone.entry(edge_key(w[0], w[1])).or_insert(1.0) += deposit;
                }
            }

            if let Some((path, cost)) = iter_paths.iter().min_by(|a, b| a.1.partial_cmp(&b.1).unwrap()) {
                if *cost < best_cost - 1e-4 {
                    best_cost = *cost;
                    best_path = Some(path.clone());
                    best_iteration = iteration;
                    stagnant = 0;
                } else {
                    stagnant += 1;
                }
            } else {
                stagnant += 1;
            }

            if self.params.mmas && best_cost.is_finite() {
                let tau_max = 1.0 / (self.params.evaporation * best_cost.max(EPSILON));
                let tau_min = tau_max / (2.0 * graph.node_count().max(1) as f64);
                for v in pheromone.values_mut() {
                    *v = v.clamp(tau_min, tau_max);
                }
            }

            report_progress(&mut progress_cb, Progress { step: iteration, best_cost });

            if stagnant >= self.params.stagnation_iterations {
                break;
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match best_path {
            Some(path) => Ok(finish_success(graph, path, weights, bandwidth_demand, seed, elapsed_ms, best_iteration)),
            None => Ok(OptResult::failure(crate::error::FailureReason::NoPath, seed, elapsed_ms)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};

    fn two_path_graph() -> Graph {
        let mut b = Graph::builder();
        for i in 0..4u32 {
            b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        }
        b = b.add_edge(0, 1, EdgeData { bandwidth: 200.0, link_delay: 3.0, link_reliability: 0.99 });
        b = b.add_edge(1, 3, EdgeData { bandwidth: 200.0, link_delay: 3.0, link_reliability: 0.99 });
        b = b.add_edge(0, 2, EdgeData { bandwidth: 800.0, link_delay: 15.0, link_reliability: 0.99 });
        b = b.add_edge(2, 3, EdgeData { bandwidth: 800.0, link_delay: 15.0, link_reliability: 0.99 });
        b.build().unwrap()
    }

    #[test]
    fn aco_respects_bandwidth_demand() {
        let g = two_path_graph();
        let aco = AntColony::default();
        let weights = Weights { delay: 0.0, reliability: 0.0, resource: 1.0 };
        let result = aco.optimize(&g, 0, 3, weights, 500.0, 3, None, None).unwrap();
        assert!(result.success);
        assert!(result.min_bandwidth >= 500.0);
    }

    #[test]
    fn aco_is_deterministic_for_a_fixed_seed() {
        let g = two_path_graph();
        let aco = AntColony::default();
        let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
        let r1 = aco.optimize(&g, 0, 3, weights, 0.0, 11, None, None).unwrap();
        let r2 = aco.optimize(&g, 0, 3, weights, 0.0, 11, None, None).unwrap();
        assert_eq!(r1.path, r2.path);
    }
}
