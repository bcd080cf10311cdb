//! # Genetic Algorithm (§4.3)
//!
//! Population-based search: seed with a handful of deterministic shortest paths plus guided and
//! uniform random walks, then iterate tournament selection, edge-based crossover, and a
//! diversity-adaptive mutation schedule until stagnation or `max_generations`.

use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use crate::config::GaParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::pathutil::{cached_shortest_path, guided_random_walk, max_walk_len, uniform_random_walk, WeightScheme};
use crate::result::{OptResult, Seed};
use crate::rng::rng_from_seed;

use super::common::{common_internal_nodes, node_insertion, node_replacement, population_diversity, segment_replacement, splice_at};
use super::{common_precheck, finish_success, report_progress, CancelFlag, Optimizer, Progress, ProgressCallback};

/// Parallelize fitness evaluation only above this scale (§5 intra-call parallelism threshold).
const PARALLEL_NODE_THRESHOLD: usize = 500;
const PARALLEL_POP_THRESHOLD: usize = 200;

/// The Genetic Algorithm optimizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneticAlgorithm {
    params: GaParams,
}

impl GeneticAlgorithm {
    /// Build with explicit parameters.
    pub fn new(params: GaParams) -> Self {
        GeneticAlgorithm { params }
    }

    fn seed_population(
        &self,
        graph: &Graph,
        s: NodeId,
        d: NodeId,
        bandwidth: f64,
        pop_size: usize,
        max_len: usize,
        rng: &mut impl Rng,
    ) -> Vec<Vec<NodeId>> {
        let mut pop: Vec<Vec<NodeId>> = Vec::with_capacity(pop_size);
        for scheme in [WeightScheme::Hops, WeightScheme::LinkDelay, WeightScheme::NegLogReliability] {
            if let Some(p) = cached_shortest_path(graph, s, d, bandwidth, scheme) {
                pop.push(p);
            }
        }

        let guided_target = pop_size / 2;
        let mut attempts = 0;
        while pop.len() < guided_target && attempts < pop_size * 10 {
            attempts += 1;
            if let Some(p) = guided_random_walk(graph, s, d, bandwidth, max_len, rng) {
                pop.push(p);
            }
        }

        attempts = 0;
        while pop.len() < pop_size && attempts < pop_size * 20 {
            attempts += 1;
            if let Some(p) = uniform_random_walk(graph, s, d, bandwidth, max_len, rng) {
                pop.push(p);
            }
        }

        pop
    }

    fn evaluate_population(&self, graph: &Graph, pop: &[Vec<NodeId>], weights: Weights, bandwidth: f64) -> Vec<f64> {
        let parallel = graph.node_count() >= PARALLEL_NODE_THRESHOLD && pop.len() >= PARALLEL_POP_THRESHOLD;
        if parallel {
            pop.par_iter().map(|p| evaluate(graph, p, weights, bandwidth).1).collect()
        } else {
            pop.iter().map(|p| evaluate(graph, p, weights, bandwidth).1).collect()
        }
    }

    fn tournament_select(&self, costs: &[f64], rng: &mut impl Rng) -> usize {
        let mut best = rng.gen_range(0..costs.len());
        for _ in 1..self.params.tournament_k {
            let candidate = rng.gen_range(0..costs.len());
            if costs[candidate] < costs[best] {
                best = candidate;
            }
        }
        best
    }

    fn crossover(&self, p1: &[NodeId], p2: &[NodeId], rng: &mut impl Rng) -> (Vec<NodeId>, Vec<NodeId>) {
        if rng.gen::<f64>() >= self.params.crossover_rate {
            return (p1.to_vec(), p2.to_vec());
        }
        let common = common_internal_nodes(p1, p2);
        if common.is_empty() {
            return (p1.to_vec(), p2.to_vec());
        }
        let c = common[rng.gen_range(0..common.len())];
        let child1 = splice_at(p1, p2, c).unwrap_or_else(|| p1.to_vec());
        let child2 = splice_at(p2, p1, c).unwrap_or_else(|| p2.to_vec());
        (child1, child2)
    }

    fn mutate(
        &self,
        graph: &Graph,
        path: &[NodeId],
        bandwidth: f64,
        max_len: usize,
        diversity: f64,
        rng: &mut impl Rng,
    ) -> Vec<NodeId> {
        let result = if diversity < 0.05 {
            segment_replacement(graph, path, bandwidth, max_len, rng)
        } else if diversity < 0.15 {
            node_insertion(graph, path, bandwidth, rng)
        } else {
            node_replacement(graph, path, bandwidth, rng)
        };
        result.unwrap_or_else(|| path.to_vec())
    }
}

impl Optimizer for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "GA"
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
        let pop_size = self.params.population_size(node_count);
        let avg_hint = cached_shortest_path(graph, source, destination, 0.0, WeightScheme::Hops)
            .map(|p| p.len())
            .unwrap_or(node_count / 2);
        let max_len = max_walk_len(node_count, avg_hint);

        let mut population = self.seed_population(graph, source, destination, bandwidth_demand, pop_size, max_len, &mut rng);
        if population.is_empty() {
            return Ok(OptResult::failure(
                crate::error::FailureReason::NoPath,
                seed,
                start.elapsed().as_secs_f64() * 1000.0,
            ));
        }
        while population.len() < pop_size {
            let idx = rng.gen_range(0..population.len());
            population.push(population[idx].clone());
        }

        let mut best_path = population[0].clone();
        let mut best_cost = f64::INFINITY;
        let mut best_generation: u64 = 0;
        let mut stagnant: u64 = 0;

        let elite_count = ((pop_size as f64) * self.params.elitism_fraction).floor() as usize;

        for generation in 0..self.params.max_generations {
            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                break;
            }

            let costs = self.evaluate_population(graph, &population, weights, bandwidth_demand);
            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| costs[a].partial_cmp(&costs[b]).unwrap());

            let gen_best_idx = order[0];
            if costs[gen_best_idx] < best_cost - self.params.stagnation_eps {
                best_cost = costs[gen_best_idx];
                best_path = population[gen_best_idx].clone();
                best_generation = generation;
                stagnant = 0;
            } else {
                stagnant += 1;
            }

            report_progress(&mut progress_cb, Progress { step: generation, best_cost });

            if stagnant >= self.params.stagnation_generations {
                break;
            }

            let diversity = population_diversity(&population, 30, &mut rng);
            let mutation_rate = if diversity < 0.10 {
                (self.params.mutation_rate * 2.5).min(0.30)
            } else {
                self.params.mutation_rate
            };

            let mut next_gen: Vec<Vec<NodeId>> = Vec::with_capacity(pop_size);
            for &idx in order.iter().take(elite_count) {
                next_gen.push(population[idx].clone());
            }

            while next_gen.len() < pop_size {
                let i = self.tournament_select(&costs, &mut rng);
                let j = self.tournament_select(&costs, &mut rng);
                let (mut c1, mut c2) = self.crossover(&population[i], &population[j], &mut rng);
                if rng.gen::<f64>() < mutation_rate {
                    c1 = self.mutate(graph, &c1, bandwidth_demand, max_len, diversity, &mut rng);
                }
                if rng.gen::<f64>() < mutation_rate {
                    c2 = self.mutate(graph, &c2, bandwidth_demand, max_len, diversity, &mut rng);
                }
                next_gen.push(c1);
                if next_gen.len() < pop_size {
                    next_gen.push(c2);
                }
            }
            population = next_gen;
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(finish_success(graph, best_path, weights, bandwidth_demand, seed, elapsed_ms, best_generation))
    }
}
