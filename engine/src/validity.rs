//! # Validity checker
//!
//! Verifies simple-path structure, edge existence, endpoint match, and bandwidth feasibility,
//! independent of the cost model. Every optimizer is expected to run its final candidate
//! through [`check`] before returning a successful [`crate::result::OptResult`] (§8 invariant 1
//! and 2; §8 "validity checker" property 6).

use std::collections::HashSet;

use crate::graph::{Graph, NodeId};

/// Reasons [`check`] can reject a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Fewer than two nodes.
    TooShort,
    /// A node appears more than once (not a simple path).
    RepeatedNode(NodeId),
    /// A consecutive pair is not an edge of the graph.
    MissingEdge(NodeId, NodeId),
    /// `path[0] != source`.
    WrongSource,
    /// `path[path.len() - 1] != destination`.
    WrongDestination,
    /// Some edge's bandwidth fell below the demand.
    BandwidthInsufficient,
}

/// Checks that `path` is a simple path from `source` to `destination` in `graph`, with every
/// edge bandwidth at least `bandwidth_demand`. Returns the first violation found, in the order
/// listed in [`Violation`], or `Ok(())` if the path is valid.
pub fn check(
    graph: &Graph,
    path: &[NodeId],
    source: NodeId,
    destination: NodeId,
    bandwidth_demand: f64,
) -> Result<(), Violation> {
    if path.len() < 2 {
        return Err(Violation::TooShort);
    }
    if path[0] != source {
        return Err(Violation::WrongSource);
    }
    if path[path.len() - 1] != destination {
        return Err(Violation::WrongDestination);
    }

    let mut seen = HashSet::with_capacity(path.len());
    for &n in path {
        if !seen.insert(n) {
            return Err(Violation::RepeatedNode(n));
        }
    }

    for w in path.windows(2) {
        let (u, v) = (w[0], w[1]);
        match graph.edge(u, v) {
            None => return Err(Violation::MissingEdge(u, v)),
            Some(edge) if bandwidth_demand > 0.0 && edge.bandwidth < bandwidth_demand => {
                return Err(Violation::BandwidthInsufficient)
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// `true` iff `path` is a simple path (no repeated nodes).
pub fn is_simple(path: &[NodeId]) -> bool {
    let mut seen = HashSet::with_capacity(path.len());
    path.iter().all(|&n| seen.insert(n))
}
