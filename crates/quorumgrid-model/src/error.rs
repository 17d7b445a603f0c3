//! Model error types.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised at the working-set API boundary. Expected per-instance
/// placement failures are values, not errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid score: {0}")]
    InvalidScore(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),
}
