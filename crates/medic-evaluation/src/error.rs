//! Error types for the evaluation crate.

use thiserror::Error;

/// Errors that can occur while persisting or reading fix records.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Record id cannot be used as a storage key.
    #[error("invalid record id: {0:?}")]
    InvalidId(String),

    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
