//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding journal data.
///
/// Every variant describes malformed or unencodable *data*. Replay treats
/// any of them as a reason to rebuild the database from scratch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a witness or record.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a witness or record.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// A decoded item did not consume its whole chunk.
    #[error("{count} trailing bytes after decoded item")]
    TrailingBytes {
        /// Number of bytes left over.
        count: usize,
    },

    /// A chunk payload does not fit the 4-byte length prefix.
    #[error("chunk payload of {len} bytes exceeds the 4-byte length prefix")]
    ChunkTooLarge {
        /// Payload length in bytes.
        len: usize,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
