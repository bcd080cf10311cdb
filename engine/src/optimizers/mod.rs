//! # Optimizers
//!
//! Six stochastic search algorithms compete on the same QoS-constrained shortest-path
//! objective: [`ga::GeneticAlgorithm`], [`aco::AntColony`], [`pso::ParticleSwarm`],
//! [`sa::SimulatedAnnealing`], [`ql::QLearning`], and [`sarsa::Sarsa`]. They all implement
//! [`Optimizer`], so the experiment runner depends only on that capability, never on any
//! algorithm's internal state (§9 "Polymorphism over optimizers").

pub mod aco;
pub(crate) mod common;
pub mod ga;
pub mod pso;
pub mod ql;
pub mod sa;
pub mod sarsa;
pub(crate) mod td;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::warn;

use crate::error::{Error, FailureReason};
use crate::graph::{Graph, NodeId};
use crate::metrics::Weights;
use crate::pathutil::reachable_under_bandwidth;
use crate::result::{OptResult, Seed};

/// Cooperative cancellation flag, checked at most once per generation/iteration/episode.
/// Cloning shares the same underlying flag (mirrors the grounding stack's `Stopper`).
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is never set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Poll whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Snapshot handed to the progress callback at most once per outer loop iteration.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Current generation / iteration / episode counter.
    pub step: u64,
    /// Best cost found so far (possibly `f64::INFINITY` if nothing feasible yet).
    pub best_cost: f64,
}

/// Cooperative progress/cancellation callback. Must never mutate engine state; if it panics,
/// the engine logs the panic and continues (§5 "Suspension points").
pub type ProgressCallback<'a> = dyn FnMut(Progress) + 'a;

/// Invoke `cb` with `progress`, swallowing and logging any panic so a misbehaving callback
/// cannot abort the search.
pub(crate) fn report_progress(cb: &mut Option<&mut ProgressCallback>, progress: Progress) {
    if let Some(cb) = cb.as_mut() {
        let result = catch_unwind(AssertUnwindSafe(|| cb(progress)));
        if result.is_err() {
            warn!("progress callback panicked; continuing search");
        }
    }
}

/// Validate the call-level preconditions shared by every optimizer (§6): both endpoints exist,
/// the weights are non-negative and sum to one within `1e-6`, and the bandwidth demand is
/// non-negative. These are programming errors and abort the call (`Err`), distinct from
/// domain-level search failures which are reported in-band on [`OptResult`] (§7).
pub fn validate_call(
    graph: &Graph,
    source: NodeId,
    destination: NodeId,
    weights: Weights,
    bandwidth_demand: f64,
) -> Result<(), Error> {
    if !graph.has_node(source) {
        return Err(Error::UnknownNode(source));
    }
    if !graph.has_node(destination) {
        return Err(Error::UnknownNode(destination));
    }
    if weights.delay < 0.0 || weights.reliability < 0.0 || weights.resource < 0.0 {
        let worst = weights.delay.min(weights.reliability).min(weights.resource);
        return Err(Error::NegativeWeight(worst));
    }
    let sum = weights.delay + weights.reliability + weights.resource;
    if (sum - 1.0).abs() > 1e-6 {
        return Err(Error::InvalidWeights(sum));
    }
    if bandwidth_demand < 0.0 {
        return Err(Error::NegativeBandwidth(bandwidth_demand));
    }
    Ok(())
}

/// Runs the preconditions every optimizer needs before doing any search work: validates the
/// call (returning `Err` on malformed input), then checks the two domain-level shortcuts that
/// must short-circuit without spending a single generation/iteration (§7, §8 boundary
/// behaviors): `source == destination`, and `destination` unreachable from `source` under the
/// bandwidth filter.
///
/// Returns `Ok(Some(result))` when the call should terminate immediately with `result`,
/// `Ok(None)` when the caller should proceed with its algorithm-specific search.
pub fn common_precheck(
    graph: &Graph,
    source: NodeId,
    destination: NodeId,
    weights: Weights,
    bandwidth_demand: f64,
    seed: Seed,
    start: Instant,
) -> Result<Option<OptResult>, Error> {
    validate_call(graph, source, destination, weights, bandwidth_demand)?;

    let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

    if source == destination {
        return Ok(Some(OptResult::failure(FailureReason::SameNode, seed, elapsed_ms())));
    }
    if !reachable_under_bandwidth(graph, source, destination, bandwidth_demand) {
        return Ok(Some(OptResult::failure(FailureReason::NoPath, seed, elapsed_ms())));
    }
    Ok(None)
}

/// Builds a successful [`OptResult`] from a validated path, computing its metrics via
/// [`crate::metrics::evaluate`] so `fitness` always equals the metric kernel's cost (§8
/// invariant 3).
pub(crate) fn finish_success(
    graph: &Graph,
    path: Vec<NodeId>,
    weights: Weights,
    bandwidth_demand: f64,
    seed: Seed,
    elapsed_ms: f64,
    converged_generation: u64,
) -> OptResult {
    let (metrics, cost, failure) = crate::metrics::evaluate(graph, &path, weights, bandwidth_demand);
    if let Some(reason) = failure {
        return OptResult::failure(reason, seed, elapsed_ms);
    }
    OptResult {
        path,
        fitness: cost,
        total_delay: metrics.total_delay,
        total_reliability: metrics.total_reliability,
        resource_cost: metrics.resource_cost,
        min_bandwidth: metrics.min_bandwidth,
        computation_time_ms: elapsed_ms,
        converged_generation,
        seed_used: seed,
        success: true,
        failure_reason: None,
    }
}

/// Common interface implemented by every optimizer (§6, §9).
pub trait Optimizer {
    /// Short, stable name used in reports and CLI `--algos` selection (e.g. `"GA"`, `"ACO"`).
    fn name(&self) -> &'static str;

    /// Find a QoS-constrained path from `source` to `destination`.
    ///
    /// `progress_cb`, if given, is invoked at most once per outer-loop step with the current
    /// best cost; `cancel`, if given, is polled at the same cadence, and a cancellation before
    /// any feasible path was found yields `failure_reason = TIMEOUT` (§5).
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
    ) -> Result<OptResult, Error>;
}

pub use aco::AntColony;
pub use ga::GeneticAlgorithm;
pub use pso::ParticleSwarm;
pub use ql::QLearning;
pub use sa::SimulatedAnnealing;
pub use sarsa::Sarsa;
