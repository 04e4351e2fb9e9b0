//! Error types for dataset access.

use std::path::PathBuf;
use thiserror::Error;

use pretrain_index::IndexError;
use pretrain_store::StoreError;

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Failure signaled by an injected two-view transform.
///
/// Aborts the single access that invoked the transform; the index table and
/// other in-flight accesses are unaffected.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    /// Description of the failure.
    pub message: String,
}

impl TransformError {
    /// Creates a new transform error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur while opening a dataset or accessing a sample.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Global sample index past the end of the dataset.
    ///
    /// A caller error: the index is never clamped and no default sample is
    /// substituted.
    #[error("sample index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange {
        /// The requested global index.
        index: usize,
        /// The dataset length.
        len: usize,
    },

    /// A container could not be opened during access.
    #[error("failed to open container {container}: {source}")]
    StoreOpen {
        /// The container that failed.
        container: PathBuf,
        /// The underlying storage error.
        source: StoreError,
    },

    /// A single record could not be read.
    ///
    /// Scoped to the access that triggered it; the index stays valid.
    #[error("failed to read record {local_index} of {path} in {container}: {source}")]
    RecordRead {
        /// The container holding the record.
        container: PathBuf,
        /// Leaf path within the container.
        path: String,
        /// Record offset within the leaf collection.
        local_index: usize,
        /// The underlying storage error.
        source: StoreError,
    },

    /// A record's payload disagreed with its declared shape.
    #[error("malformed record shape: {reason}")]
    RecordShape {
        /// Description of the mismatch.
        reason: String,
    },

    /// The injected transform failed.
    #[error("transform failed: {reason}")]
    Transform {
        /// Description of the failure.
        reason: String,
    },

    /// Index construction failed while opening the dataset.
    #[error("index build failed: {0}")]
    Build(#[from] IndexError),
}

impl DatasetError {
    /// Creates a record shape error.
    #[must_use]
    pub fn record_shape(reason: impl Into<String>) -> Self {
        Self::RecordShape {
            reason: reason.into(),
        }
    }

    /// Creates a transform error.
    #[must_use]
    pub fn transform(reason: impl Into<String>) -> Self {
        Self::Transform {
            reason: reason.into(),
        }
    }
}

impl From<TransformError> for DatasetError {
    fn from(err: TransformError) -> Self {
        Self::Transform {
            reason: err.message,
        }
    }
}
