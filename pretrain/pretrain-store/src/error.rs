//! Error types for vault storage operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while opening or reading a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Container file not found.
    #[error("container not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// File does not start with the vault magic bytes.
    #[error("bad magic: expected FVLT, got {found:?}")]
    BadMagic {
        /// The four bytes actually read.
        found: [u8; 4],
    },

    /// Format version this build does not understand.
    #[error("unsupported vault version: {version}")]
    UnsupportedVersion {
        /// Version number found in the header.
        version: u16,
    },

    /// Malformed table of contents.
    #[error("invalid table of contents: {message}")]
    InvalidToc {
        /// Description of what was invalid.
        message: String,
    },

    /// Malformed payload description.
    #[error("invalid payload: {message}")]
    InvalidPayload {
        /// Description of what was invalid.
        message: String,
    },

    /// Unexpected end of file.
    #[error("unexpected end of file at position {position}")]
    UnexpectedEof {
        /// Byte position where EOF was encountered.
        position: u64,
    },

    /// A leaf collection declared zero or degenerate dimensions.
    #[error("invalid record shape: {height}x{width}x{channels}")]
    InvalidShape {
        /// Record height in pixels.
        height: u32,
        /// Record width in pixels.
        width: u32,
        /// Number of channels.
        channels: u32,
    },

    /// A group or leaf key was not present in the container.
    #[error("key not found: {key}")]
    MissingKey {
        /// The missing key, as a `clip/variant/collection` path prefix.
        key: String,
    },

    /// A group or leaf key was added twice.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// The duplicated key.
        key: String,
    },

    /// Record index past the end of its leaf collection.
    #[error("record index {index} out of range for leaf of {count} records")]
    RecordOutOfRange {
        /// The requested record index.
        index: usize,
        /// Number of records in the leaf collection.
        count: usize,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error in a stored name.
    #[error("invalid UTF-8 in name: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),
}

impl StoreError {
    /// Create an `InvalidToc` error with the given message.
    #[must_use]
    pub fn invalid_toc(message: impl Into<String>) -> Self {
        Self::InvalidToc {
            message: message.into(),
        }
    }

    /// Create an `InvalidPayload` error with the given message.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create a `MissingKey` error with the given key.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }
}
