use std::path::PathBuf;

use crate::key::RecordKey;

/// Errors from property store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record data is malformed or cannot be decoded.
    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: RecordKey, reason: String },

    /// The store was sealed after ingestion.
    #[error("store is read-only")]
    ReadOnly,

    /// A new store must start from an empty directory.
    #[error("store directory is not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    /// No store exists at the given path.
    #[error("no store at {0}")]
    MissingStore(PathBuf),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
