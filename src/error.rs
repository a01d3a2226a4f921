use thiserror::Error;

/// Error taxonomy for the matching engine.
///
/// Configuration issues that the engine can work around (weights not summing
/// to 1, unknown criterion names) are not errors: they are logged as warnings
/// and scored neutrally.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Malformed caller input: empty/non-finite/oversized matrices, invalid
    /// weights, mismatched matrix shapes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A broken internal invariant, including solver failures (e.g. the
    /// recomputed assignment cost disagrees with the reported total).
    /// Indicates a bug, not an input problem, and is never masked by a
    /// partial result.
    #[error("internal consistency check failed: {0}")]
    Internal(String),

    /// A single constraint's evaluation failed. Isolated per constraint by
    /// the aggregator; surfaced here only when a caller evaluates one directly.
    #[error("constraint '{name}' failed to evaluate: {reason}")]
    ConstraintEvaluation { name: String, reason: String },

    /// An injected collaborator (skill similarity, quality predictor) failed.
    /// Criteria fall back to their heuristic path on this.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, MatchError>;
