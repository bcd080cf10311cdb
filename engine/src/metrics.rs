//! # Metric & cost kernel
//!
//! [`evaluate`] is the single pass over a candidate path that every optimizer and the
//! experiment runner call to turn a path into a [`PathMetrics`] and a scalar [`cost`]. It is
//! pure and thread-safe: the same `(path, weights, bandwidth)` tuple always yields the same
//! metrics, which is what makes determinism (§8 property 5) and the round-trip invariant
//! (§8 property 3) checkable.

use serde::{Deserialize, Serialize};

use crate::error::FailureReason;
use crate::graph::{Graph, NodeId};

/// The three QoS weights, required to sum to one within `1e-6`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight on normalized delay.
    pub delay: f64,
    /// Weight on normalized reliability cost.
    pub reliability: f64,
    /// Weight on normalized resource cost (hop count proxy).
    pub resource: f64,
}

impl Weights {
    /// `true` iff all components are non-negative and they sum to one within `1e-6`.
    pub fn is_valid(&self) -> bool {
        self.delay >= 0.0
            && self.reliability >= 0.0
            && self.resource >= 0.0
            && (self.delay + self.reliability + self.resource - 1.0).abs() <= 1e-6
    }
}

/// Raw, un-normalized metrics for a path, computed by a single traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathMetrics {
    /// Sum of per-edge link delays plus per-internal-node processing delays, in ms.
    pub total_delay: f64,
    /// Product of per-edge link reliabilities and per-internal-node reliabilities.
    pub total_reliability: f64,
    /// Sum of `1000 / bandwidth` over every edge on the path.
    pub resource_cost: f64,
    /// Minimum edge bandwidth along the path.
    pub min_bandwidth: f64,
    /// Hop count `|P|`.
    pub hops: usize,
}

/// `a` dominates `b` iff `a` is no worse in every raw metric and strictly better in at least
/// one: `a.total_delay <= b.total_delay`, `a.total_reliability >= b.total_reliability`,
/// `a.resource_cost <= b.resource_cost`, with at least one strict inequality. Underpins Pareto
/// analysis (§4.1) and the weighted-sum monotonicity invariant (§8 property 4).
pub fn dominates(a: &PathMetrics, b: &PathMetrics) -> bool {
    let no_worse = a.total_delay <= b.total_delay
        && a.total_reliability >= b.total_reliability
        && a.resource_cost <= b.resource_cost;
    let strictly_better = a.total_delay < b.total_delay
        || a.total_reliability > b.total_reliability
        || a.resource_cost < b.resource_cost;
    no_worse && strictly_better
}

fn norm_delay(total_delay: f64) -> f64 {
    (total_delay / 200.0).min(1.0)
}

fn norm_reliability_cost(total_reliability: f64) -> f64 {
    ((1.0 - total_reliability) * 10.0).min(1.0)
}

fn norm_resource(hops: usize) -> f64 {
    (hops as f64 / 20.0).min(1.0)
}

/// Combine raw metrics and weights into the normalized scalar cost every optimizer minimizes.
/// Returns `f64::INFINITY` if `bandwidth_demand > 0.0` and `metrics.min_bandwidth` falls below
/// it (the hard bandwidth constraint).
pub fn weighted_cost(metrics: &PathMetrics, weights: Weights, bandwidth_demand: f64) -> f64 {
    if bandwidth_demand > 0.0 && metrics.min_bandwidth < bandwidth_demand {
        return f64::INFINITY;
    }
    weights.delay * norm_delay(metrics.total_delay)
        + weights.reliability * norm_reliability_cost(metrics.total_reliability)
        + weights.resource * norm_resource(metrics.hops)
}

/// Single pass over `path`, yielding raw metrics and the weighted, bandwidth-gated cost.
///
/// Preconditions per §4.1: `path.len() >= 2` and every consecutive pair must be an edge of
/// `graph`. If any edge is missing, returns `cost = +inf` with
/// [`FailureReason::InvalidEdge`]; metrics in that case are zeroed and must not be trusted.
pub fn evaluate(
    graph: &Graph,
    path: &[NodeId],
    weights: Weights,
    bandwidth_demand: f64,
) -> (PathMetrics, f64, Option<FailureReason>) {
    debug_assert!(path.len() >= 2, "evaluate requires a path with at least two nodes");

    let mut total_delay = 0.0;
    let mut total_reliability = 1.0;
    let mut resource_cost = 0.0;
    let mut min_bandwidth = f64::INFINITY;

    for w in path.windows(2) {
        let (u, v) = (w[0], w[1]);
        let Some(edge) = graph.edge(u, v) else {
            let zero = PathMetrics {
                total_delay: 0.0,
                total_reliability: 0.0,
                resource_cost: 0.0,
                min_bandwidth: 0.0,
                hops: path.len().saturating_sub(1),
            };
            return (zero, f64::INFINITY, Some(FailureReason::InvalidEdge));
        };
        total_delay += edge.link_delay;
        total_reliability *= edge.link_reliability;
        resource_cost += 1000.0 / edge.bandwidth;
        min_bandwidth = min_bandwidth.min(edge.bandwidth);
    }

    for &node in &path[1..path.len() - 1] {
        if let Some(data) = graph.node(node) {
            total_delay += data.processing_delay;
            total_reliability *= data.node_reliability;
        }
    }

    let metrics = PathMetrics {
        total_delay,
        total_reliability,
        resource_cost,
        min_bandwidth,
        hops: path.len() - 1,
    };
    let cost = weighted_cost(&metrics, weights, bandwidth_demand);
    let failure = if cost.is_infinite() {
        Some(FailureReason::BandwidthInsufficient)
    } else {
        None
    };
    (metrics, cost, failure)
}

/// Minimum edge bandwidth along `path`, or `f64::INFINITY` if the path has no edges (degenerate
/// single-node "path").
pub fn min_bandwidth(graph: &Graph, path: &[NodeId]) -> f64 {
    path.windows(2)
        .filter_map(|w| graph.edge(w[0], w[1]))
        .map(|e| e.bandwidth)
        .fold(f64::INFINITY, f64::min)
}
