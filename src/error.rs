use thiserror::Error;

/// Error types for the polyhedral hull engine
#[derive(Debug, Error)]
pub enum HullError {
    /// Linear programming solver failure
    #[error("linear programming failed: {reason}")]
    LpFailure { reason: String },

    /// Basic sets of one operation disagree on their dimension schema
    #[error("space mismatch: {left} vs {right} columns")]
    SpaceMismatch { left: usize, right: usize },

    /// A constraint row has the wrong number of columns
    #[error("dimension mismatch: expected {expected} columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A matrix inverse was requested for a rank-deficient matrix
    #[error("matrix of rank {rank} has no inverse over {rows} rows")]
    SingularMatrix { rows: usize, rank: usize },

    /// An internal precondition was violated
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Generic computation error
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Result type alias for hull operations
pub type Result<T> = std::result::Result<T, HullError>;
