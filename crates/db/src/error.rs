//! Error types for the document storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing stored documents.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("storage I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored document for '{key}' could not be encoded or decoded")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
