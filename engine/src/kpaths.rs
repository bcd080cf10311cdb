//! # k-Path / Pareto benchmarks
//!
//! Enumerates the k cheapest simple paths (via [`crate::pathutil::k_simple_paths`]), extracts
//! the Pareto dominance front over them, and computes the "optimality gap" of any algorithm's
//! result against that bounded benchmark. This is a benchmark utility, not an ILP-optimal
//! solver (§1 Non-goals): it is only as good as the `k_max` bound allows.

use crate::graph::{Graph, NodeId};
use crate::metrics::{dominates, evaluate, PathMetrics, Weights};
use crate::pathutil::{k_simple_paths, WeightScheme};

/// Default bound on the number of candidate paths enumerated (§4.2 default `k_max = 500`).
pub const DEFAULT_K_MAX: usize = 500;

/// One candidate produced by [`enumerate`]: the path, its raw metrics, and its weighted cost
/// under the caller's weights.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The simple path.
    pub path: Vec<NodeId>,
    /// Its raw metrics.
    pub metrics: PathMetrics,
    /// Its weighted cost under the caller's weights and bandwidth demand.
    pub cost: f64,
}

/// Picks the edge-weight scheme whose objective best approximates the caller's weights: the
/// scheme corresponding to whichever of (delay, reliability, resource) weighs most, defaulting
/// to hop count when weights are balanced or resource-dominant.
fn scheme_for_weights(weights: Weights) -> WeightScheme {
    if weights.delay >= weights.reliability && weights.delay >= weights.resource {
        WeightScheme::LinkDelay
    } else if weights.reliability >= weights.resource {
        WeightScheme::NegLogReliability
    } else {
        WeightScheme::Hops
    }
}

/// Enumerate up to `k_max` simple paths from `s` to `d` feasible under `bandwidth`, each
/// evaluated under `weights`, sorted ascending by true weighted cost (not the raw enumeration
/// weight, which only orders candidates for bounding the search).
pub fn enumerate(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    weights: Weights,
    k_max: usize,
) -> Vec<Candidate> {
    let scheme = scheme_for_weights(weights);
    let raw = k_simple_paths(graph, s, d, bandwidth, k_max, scheme);
    let mut candidates: Vec<Candidate> = raw
        .into_iter()
        .map(|path| {
            let (metrics, cost, _) = evaluate(graph, &path, weights, bandwidth);
            Candidate { path, metrics, cost }
        })
        .collect();
    candidates.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap());
    candidates
}

/// The single cheapest candidate among up to `k_max` bounded enumeration results, used as the
/// optimality-gap benchmark. `None` if no feasible path exists.
pub fn best_benchmark(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    weights: Weights,
    k_max: usize,
) -> Option<Candidate> {
    enumerate(graph, s, d, bandwidth, weights, k_max)
        .into_iter()
        .find(|c| c.cost.is_finite())
}

/// Indices (into `candidates`) of the non-dominated (Pareto-optimal) subset, per
/// [`crate::metrics::dominates`].
pub fn pareto_front(candidates: &[Candidate]) -> Vec<usize> {
    let mut front = Vec::new();
    for (i, c) in candidates.iter().enumerate() {
        let dominated = candidates
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && dominates(&other.metrics, &c.metrics));
        if !dominated {
            front.push(i);
        }
    }
    front
}

/// `(cost_algo - cost_benchmark) / cost_benchmark`. `None` if the benchmark cost is zero or
/// non-finite (the gap is undefined in that degenerate case).
pub fn optimality_gap(cost_algo: f64, cost_benchmark: f64) -> Option<f64> {
    if !cost_benchmark.is_finite() || cost_benchmark == 0.0 || !cost_algo.is_finite() {
        return None;
    }
    Some((cost_algo - cost_benchmark) / cost_benchmark)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};

    fn two_path_graph() -> Graph {
        // S=0 -- a=1 -- D=3 (low bandwidth), and S=0 -- b=2 -- D=3 (high bandwidth)
        let mut b = Graph::builder();
        for i in 0..4u32 {
            b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        }
        b = b.add_edge(0, 1, EdgeData { bandwidth: 200.0, link_delay: 5.0, link_reliability: 0.99 });
        b = b.add_edge(1, 3, EdgeData { bandwidth: 200.0, link_delay: 5.0, link_reliability: 0.99 });
        b = b.add_edge(0, 2, EdgeData { bandwidth: 800.0, link_delay: 5.0, link_reliability: 0.99 });
        b = b.add_edge(2, 3, EdgeData { bandwidth: 800.0, link_delay: 5.0, link_reliability: 0.99 });
        b.build().unwrap()
    }

    #[test]
    fn benchmark_respects_bandwidth_demand() {
        let g = two_path_graph();
        let weights = Weights { delay: 0.0, reliability: 0.0, resource: 1.0 };
        let best = best_benchmark(&g, 0, 3, 500.0, weights, DEFAULT_K_MAX).unwrap();
        assert_eq!(best.path, vec![0, 2, 3]);
        assert!(best.metrics.min_bandwidth >= 500.0);
    }

    #[test]
    fn optimality_gap_zero_for_self() {
        let g = two_path_graph();
        let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
        let best = best_benchmark(&g, 0, 3, 0.0, weights, DEFAULT_K_MAX).unwrap();
        let gap = optimality_gap(best.cost, best.cost).unwrap();
        assert!(gap.abs() < 1e-9);
    }
}
