//! # Particle Swarm Optimization (§4.5)
//!
//! Paths are discrete, so a particle's "velocity" is encoded as a probability perturbation over
//! next-hop choices: at each step the next hop is drawn proportional to a blend of the
//! particle's own previous path (inertia), its personal best, and the swarm's global best.

use std::time::Instant;

use rand::Rng;

use crate::config::PsoParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::pathutil::{feasible_neighbors, max_walk_len, uniform_random_walk};
use crate::result::{OptResult, Seed};
use crate::rng::rng_from_seed;

use super::{common_precheck, finish_success, report_progress, CancelFlag, Optimizer, Progress, ProgressCallback};

/// Floor added to every candidate's score so a neighbor with no inertia/pbest/gbest support can
/// still be chosen (keeps the swarm from getting stuck).
const EXPLORATION_FLOOR: f64 = 0.05;

fn edge_in_path(path: &[NodeId], u: NodeId, v: NodeId) -> bool {
    path.windows(2).any(|w| w[0] == u && w[1] == v)
}

struct Particle {
    current: Vec<NodeId>,
    pbest: Vec<NodeId>,
    pbest_cost: f64,
}

/// The Particle Swarm Optimization optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleSwarm {
    params: PsoParams,
}

impl ParticleSwarm {
    /// Build with explicit parameters.
    pub fn new(params: PsoParams) -> Self {
        ParticleSwarm { params }
    }

    #[allow(clippy::too_many_arguments)]
    fn reconstruct(
        &self,
        graph: &Graph,
        s: NodeId,
        d: NodeId,
        bandwidth: f64,
        max_len: usize,
        prev: &[NodeId],
        pbest: &[NodeId],
        gbest: &[NodeId],
        r1: f64,
        r2: f64,
        rng: &mut impl Rng,
    ) -> Option<Vec<NodeId>> {
        let mut path = vec![s];
        let mut current = s;
        while current != d {
            if path.len() > max_len {
                return None;
            }
            let candidates = feasible_neighbors(graph, current, bandwidth, &path);
            if candidates.is_empty() {
                return None;
            }
            let scores: Vec<f64> = candidates
                .iter()
                .map(|&v| {
                    let mut score = EXPLORATION_FLOOR;
                    if edge_in_path(prev, current, v) {
                        score += self.params.inertia;
                    }
                    if edge_in_path(pbest, current, v) {
                        score += self.params.c1 * r1;
                    }
                    if edge_in_path(gbest, current, v) {
                        score += self.params.c2 * r2;
                    }
                    score
                })
                .collect();
            let total: f64 = scores.iter().sum();
            let mut rv = rng.gen::<f64>() * total;
            let mut chosen = candidates[candidates.len() - 1];
            for (i, &w) in scores.iter().enumerate() {
                if rv < w {
                    chosen = candidates[i];
                    break;
                }
                rv -= w;
            }
            path.push(chosen);
            current = chosen;
        }
        Some(path)
    }
}

impl Optimizer for ParticleSwarm {
    fn name(&self) -> &'static str {
        "PSO"
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

        let mut particles: Vec<Particle> = Vec::with_capacity(self.params.n_particles);
        let mut attempts = 0;
        while particles.len() < self.params.n_particles && attempts < self.params.n_particles * 20 {
            attempts += 1;
            if let Some(path) = uniform_random_walk(graph, source, destination, bandwidth_demand, max_len, &mut rng) {
                let (_, cost, _) = evaluate(graph, &path, weights, bandwidth_demand);
                particles.push(Particle { current: path.clone(), pbest: path, pbest_cost: cost });
            }
        }
        if particles.is_empty() {
            return Ok(OptResult::failure(
                crate::error::FailureReason::NoPath,
                seed,
                start.elapsed().as_secs_f64() * 1000.0,
            ));
        }

        let mut gbest = particles.iter().min_by(|a, b| a.pbest_cost.partial_cmp(&b.pbest_cost).unwrap()).unwrap().pbest.clone();
        let mut gbest_cost = particles.iter().map(|p| p.pbest_cost).fold(f64::INFINITY, f64::min);
        let mut best_iteration: u64 = 0;
        let mut stagnant: u64 = 0;

        for iteration in 0..self.params.max_iterations {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                break;
            }

            let mut improved = false;
            for particle in particles.iter_mut() {
                let r1 = rng.gen::<f64>();
                let r2 = rng.gen::<f64>();
                if let Some(path) = self.reconstruct(
                    graph,
                    source,
                    destination,
                    bandwidth_demand,
                    max_len,
                    &particle.current,
                    &particle.pbest,
                    &gbest,
                    r1,
                    r2,
                    &mut rng,
                ) {
                    let (_, cost, _) = evaluate(graph, &path, weights, bandwidth_demand);
                    particle.current = path.clone();
                    if cost < particle.pbest_cost {
                        particle.pbest_cost = cost;
                        particle.pbest = path.clone();
                    }
                    if cost < gbest_cost - 1e-4 {
                        gbest_cost = cost;
                        gbest = path;
                        improved = true;
                    }
                }
            }

            if improved {
                stagnant = 0;
                best_iteration = iteration;
            } else {
                stagnant += 1;
            }

            report_progress(&mut progress_cb, Progress { step: iteration, best_cost: gbest_cost });

            if stagnant >= self.params.stagnation_iterations {
                break;
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        if gbest_cost.is_finite() {
            Ok(finish_success(graph, gbest, weights, bandwidth_demand, seed, elapsed_ms, best_iteration))
        } else {
            Ok(OptResult::failure(crate::error::FailureReason::NoPath, seed, elapsed_ms))
        }
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
    fn pso_finds_the_only_path_on_a_line_graph() {
        let g = line_graph(5);
        let pso = ParticleSwarm::default();
        let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
        let result = pso.optimize(&g, 0, 4, weights, 0.0, 3, None, None).unwrap();
        assert!(result.success);
        assert_eq!(result.path, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pso_is_deterministic_for_a_fixed_seed() {
        let g = line_graph(6);
        let pso = ParticleSwarm::default();
        let weights = Weights { delay: 0.4, reliability: 0.3, resource: 0.3 };
        let r1 = pso.optimize(&g, 0, 5, weights, 0.0, 99, None, None).unwrap();
        let r2 = pso.optimize(&g, 0, 5, weights, 0.0, 99, None, None).unwrap();
        assert_eq!(r1.path, r2.path);
    }
}
