//! Shared result and test-case types used across every optimizer and the experiment runner.

use serde::{Deserialize, Serialize};

use crate::error::FailureReason;
use crate::graph::NodeId;
use crate::metrics::Weights;

/// 32-bit seed fixing every stochastic choice inside a single optimizer call. Surfaced on every
/// [`OptResult`] so a run can be reproduced exactly.
pub type Seed = u32;

/// Outcome of a single `optimize(...)` call.
///
/// On success, `path` is a simple path from the caller's source to destination with
/// `min_bandwidth >= bandwidth_demand`, and `fitness` equals
/// `evaluate(path, weights, bandwidth_demand).cost` to within `1e-9` (§8 invariants 1-3). On
/// failure, `path` is empty or best-effort, and `failure_reason` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct OptResult {
    /// The path found, `[]` if no feasible path was found.
    pub path: Vec<NodeId>,
    /// The normalized weighted cost of `path`; `f64::INFINITY` on failure.
    pub fitness: f64,
    /// Raw total delay of `path`, in ms.
    pub total_delay: f64,
    /// Raw total reliability of `path`.
    pub total_reliability: f64,
    /// Raw resource cost of `path`.
    pub resource_cost: f64,
    /// Minimum edge bandwidth along `path`.
    pub min_bandwidth: f64,
    /// Wall-clock time spent inside the call, in milliseconds.
    pub computation_time_ms: f64,
    /// The generation/iteration/episode at which the algorithm's internal best stopped
    /// improving (algorithm-specific; `0` for single-shot constructions).
    pub converged_generation: u64,
    /// The seed used for this call.
    pub seed_used: Seed,
    /// Whether a valid path was found.
    pub success: bool,
    /// Set iff `success == false`.
    pub failure_reason: Option<FailureReason>,
}

impl OptResult {
    /// Build a failure result carrying no path.
    pub fn failure(reason: FailureReason, seed: Seed, elapsed_ms: f64) -> Self {
        OptResult {
            path: Vec::new(),
            fitness: f64::INFINITY,
            total_delay: 0.0,
            total_reliability: 0.0,
            resource_cost: 0.0,
            min_bandwidth: 0.0,
            computation_time_ms: elapsed_ms,
            converged_generation: 0,
            seed_used: seed,
            success: false,
            failure_reason: Some(reason),
        }
    }
}

/// A single QoS-routing scenario: source, destination, bandwidth demand, and the three
/// weights, identified by `id` and a human-readable `description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Stable identifier, e.g. `"case-07"`.
    pub id: String,
    /// Source node.
    pub source: NodeId,
    /// Destination node.
    pub destination: NodeId,
    /// Minimum per-edge bandwidth demand, in Mbps. `0.0` disables the constraint.
    pub bandwidth_requirement: f64,
    /// The three QoS weights; must sum to one within `1e-6`.
    pub weights: Weights,
    /// Human-readable summary, e.g. `"delay-dominant, moderate bandwidth"`.
    pub description: String,
}
