//! Error types and the failure taxonomy surfaced on every [`crate::result::OptResult`].

use thiserror::Error;

/// Fatal, programming-level errors that abort a call outright rather than being
/// reported as a failed [`crate::result::OptResult`].
#[derive(Debug, Error)]
pub enum Error {
    /// A node id used as source or destination does not exist in the graph.
    #[error("unknown node id: {0}")]
    UnknownNode(u32),
    /// The three QoS weights did not sum to one within tolerance.
    #[error("weights must sum to 1.0 +/- 1e-6, got {0}")]
    InvalidWeights(f64),
    /// A weight component was negative.
    #[error("weight components must be non-negative, got {0}")]
    NegativeWeight(f64),
    /// The bandwidth demand was negative.
    #[error("bandwidth demand must be non-negative, got {0}")]
    NegativeBandwidth(f64),
    /// Error bubbled up from CSV parsing of the legacy persisted formats.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Error bubbled up from JSON (de)serialization of an [`crate::report::ExperimentReport`].
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error bubbled up from filesystem access.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// An attribute loaded from a persisted format fell outside its documented range.
    #[error("attribute out of range: {0}")]
    OutOfRange(String),
}

/// The single source of truth for why an [`crate::result::OptResult`] did not succeed.
///
/// Every failed result carries exactly one of these codes, optionally paired with
/// a human-readable detail string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FailureReason {
    /// No simple path exists between source and destination under the bandwidth
    /// constraint (the graph is disconnected w.r.t. that cut).
    NoPath,
    /// The optimizer returned a path whose minimum bandwidth fell below the demand.
    BandwidthInsufficient,
    /// The call's time budget was exhausted before a result could be produced.
    Timeout,
    /// The source node does not exist in the graph. Unreachable in practice: a missing source
    /// is rejected up front as `Error::UnknownNode` rather than reported in-band. Kept for
    /// taxonomy completeness in case a future caller wants an in-band variant instead of a
    /// hard error.
    InvalidSource,
    /// The destination node does not exist in the graph. Same caveat as `InvalidSource`.
    InvalidDestination,
    /// Source and destination were the same node.
    SameNode,
    /// An edge referenced by a candidate path does not exist in the graph.
    InvalidEdge,
    /// An unexpected internal fault (should not normally occur).
    AlgorithmError,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::NoPath => "NO_PATH",
            FailureReason::BandwidthInsufficient => "BANDWIDTH_INSUFFICIENT",
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::InvalidSource => "INVALID_SOURCE",
            FailureReason::InvalidDestination => "INVALID_DESTINATION",
            FailureReason::SameNode => "SAME_NODE",
            FailureReason::InvalidEdge => "INVALID_EDGE",
            FailureReason::AlgorithmError => "ALGORITHM_ERROR",
        };
        f.write_str(s)
    }
}
