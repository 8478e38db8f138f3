//! Domain-level errors for tree mutation

use thiserror::Error;

/// Errors raised by mode-restricted tree operations.
///
/// Unknown marks and rejected moves are not errors: those operations
/// report `None`, `false` or an empty list instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("marked tree is not in chained mode")]
    NotChained,

    #[error("marked tree is in chained mode")]
    Chained,

    #[error("marked tree has reached its mark ceiling: {ceiling}")]
    MarkCeilingReached { ceiling: u64 },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
