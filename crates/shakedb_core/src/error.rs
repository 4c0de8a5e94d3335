//! Error types for ShakeDB core.
//!
//! Only failures the journal cannot recover from surface here. Malformed
//! file contents never do: replay turns them into a fresh, empty database.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ShakeDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] shakedb_storage::StorageError),

    /// A key, value or witness could not be encoded for writing.
    #[error("codec error: {0}")]
    Codec(#[from] shakedb_codec::CodecError),

    /// I/O error outside the storage backend (rename, remove, directory sync).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not permitted with the given arguments.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
