//! Schema witnesses.
//!
//! A witness is a value that describes how keys and values are laid out on
//! disk. It is written as the first chunk of every journal and it carries the
//! capability to encode and decode records in that layout. Two witnesses are
//! compatible only when they are structurally equal.

use crate::error::CodecResult;
use std::fmt::Debug;

/// A value-level descriptor of the record encoding.
///
/// Records are always decoded with the witness *stored in the file*, so a
/// witness must be able to read whatever it wrote, even if the running
/// program has since moved on to a different witness.
pub trait Witness: Clone + PartialEq + Debug + Send + Sync + Sized {
    /// Key type of the database map.
    type Key;
    /// Value type of the database map.
    type Value;

    /// Encodes the witness itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the witness cannot be encoded.
    fn encode(&self) -> CodecResult<Vec<u8>>;

    /// Decodes a witness previously produced by [`Witness::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid witness.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;

    /// Encodes a record. `None` is a tombstone.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value cannot be encoded.
    fn encode_record(&self, key: &Self::Key, value: Option<&Self::Value>)
        -> CodecResult<Vec<u8>>;

    /// Decodes a record written under this witness.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid record.
    fn decode_record(&self, bytes: &[u8]) -> CodecResult<(Self::Key, Option<Self::Value>)>;
}

/// Returns true when records stored under `stored` can be reused as-is by a
/// program running with `current`.
#[must_use]
pub fn witness_matches<W: Witness>(stored: &W, current: &W) -> bool {
    stored == current
}
