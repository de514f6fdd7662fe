use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid numeric id: {0:?}")]
    InvalidNumericId(String),

    #[error("empty entity key")]
    EmptyKey,
}
