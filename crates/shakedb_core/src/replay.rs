//! Replay of a database file into an in-memory map.
//!
//! Replay never fails. A file that cannot be trusted is reported as one of
//! the "no usable data" outcomes and the caller starts from an empty map.
//! Only [`CodecError`]s are absorbed here; panics raised by caller codecs
//! propagate untouched.

use shakedb_codec::{split_chunks, witness_matches, CodecError, Witness};
use std::collections::HashMap;
use std::hash::Hash;

use crate::header::header_excerpt;

/// The reconstructed key/value map handed to the caller.
pub type DatabaseMap<K, V> = HashMap<K, V>;

/// What replay found in a database file.
#[derive(Debug)]
pub enum ReplayOutcome<K, V> {
    /// The file does not start with the expected header.
    HeaderMismatch {
        /// Printable excerpt of what the file starts with.
        found: String,
    },
    /// The witness chunk or a record chunk failed to decode.
    ParseFailure {
        /// The decode error.
        message: String,
    },
    /// The header matched but no complete chunk follows it.
    Empty {
        /// Bytes after the header that do not form a chunk.
        slop: u64,
    },
    /// The witness and zero or more records decoded.
    Loaded {
        /// Whether the stored witness equals the current one.
        witness_matches: bool,
        /// Trailing bytes after the last complete chunk.
        slop: u64,
        /// Number of record chunks, excluding the witness chunk.
        record_count: usize,
        /// Fold of all records.
        map: DatabaseMap<K, V>,
    },
}

/// Coarse classification of a [`ReplayOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayKind {
    /// See [`ReplayOutcome::HeaderMismatch`].
    HeaderMismatch,
    /// See [`ReplayOutcome::ParseFailure`].
    ParseFailure,
    /// See [`ReplayOutcome::Empty`].
    Empty,
    /// See [`ReplayOutcome::Loaded`].
    Loaded,
}

impl<K, V> ReplayOutcome<K, V> {
    /// Returns the outcome's kind.
    #[must_use]
    pub fn kind(&self) -> ReplayKind {
        match self {
            Self::HeaderMismatch { .. } => ReplayKind::HeaderMismatch,
            Self::ParseFailure { .. } => ReplayKind::ParseFailure,
            Self::Empty { .. } => ReplayKind::Empty,
            Self::Loaded { .. } => ReplayKind::Loaded,
        }
    }
}

/// Replays `contents` against the expected header and current witness.
///
/// Records are decoded with the witness stored in the file, so records
/// written by an older schema stay readable. `current` only decides whether
/// they can be reused without a rewrite.
pub fn replay<W>(
    contents: &[u8],
    expected_header: &[u8],
    current: &W,
) -> ReplayOutcome<W::Key, W::Value>
where
    W: Witness,
    W::Key: Eq + Hash,
{
    let Some(body) = contents.strip_prefix(expected_header) else {
        return ReplayOutcome::HeaderMismatch {
            found: header_excerpt(contents),
        };
    };

    match load(body, current) {
        Ok(outcome) => outcome,
        Err(err) => ReplayOutcome::ParseFailure {
            message: err.to_string(),
        },
    }
}

fn load<W>(body: &[u8], current: &W) -> Result<ReplayOutcome<W::Key, W::Value>, CodecError>
where
    W: Witness,
    W::Key: Eq + Hash,
{
    let split = split_chunks(body);
    let Some((witness_chunk, records)) = split.chunks.split_first() else {
        return Ok(ReplayOutcome::Empty { slop: split.slop });
    };

    let stored = W::decode(witness_chunk)?;
    let mut map = DatabaseMap::new();
    for chunk in records {
        match stored.decode_record(chunk)? {
            (key, Some(value)) => {
                map.insert(key, value);
            }
            (key, None) => {
                map.remove(&key);
            }
        }
    }

    Ok(ReplayOutcome::Loaded {
        witness_matches: witness_matches(&stored, current),
        slop: split.slop,
        record_count: records.len(),
        map,
    })
}
