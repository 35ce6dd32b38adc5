//! Error types shared across the core crate.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised by desktop, widget and configuration operations.
#[derive(Debug, Error)]
pub enum FluxError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Invalid drop: {0}")]
    InvalidDrop(String),
    #[error("Moving folder {folder} into {target} would create a cycle")]
    FolderCycle { folder: String, target: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type FluxResult<T> = Result<T, FluxError>;
