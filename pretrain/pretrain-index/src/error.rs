//! Error types for index construction and lookup.

use std::path::PathBuf;
use thiserror::Error;

use pretrain_store::StoreError;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building or loading a sample index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A container could not be opened or scanned.
    ///
    /// This aborts the entire build: a partially scanned container would
    /// leave consumer-visible ranges whose storage is unusable.
    #[error("failed to open container {container}: {source}")]
    StoreOpen {
        /// The container that failed.
        container: PathBuf,
        /// The underlying storage error.
        source: StoreError,
    },

    /// The scan root is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// An index table violated its ordering invariants.
    #[error("invalid index table: {message}")]
    Validation {
        /// Description of the violated invariant.
        message: String,
    },

    /// Serialization error while persisting or loading a table.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
