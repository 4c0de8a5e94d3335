//! Journal compaction.
//!
//! Compaction rewrites the journal as header + current witness + one record
//! per live key. It runs when the stored witness is stale, so old records
//! are re-stamped under the current schema, or when the log holds far more
//! records than live keys.
//!
//! ## Crash safety
//!
//! 1. The primary is renamed to the backup (a verbatim copy).
//! 2. A fresh primary is written and synced.
//! 3. The backup is deleted.
//!
//! A crash anywhere before step 3 leaves the backup behind, and the next
//! startup restores it before replaying anything.

use crate::dir::StoragePaths;
use crate::error::CoreResult;
use crate::replay::DatabaseMap;
use shakedb_codec::{write_chunk, Witness};
use shakedb_storage::{FileBackend, StorageBackend};
use tracing::debug;

/// Returns true when a replayed log can be reused without rewriting.
///
/// The witness must match and live keys must outnumber half of
/// `record_count - 2`. Small logs are always accepted.
#[must_use]
pub fn log_is_compact(witness_matches: bool, live_keys: usize, record_count: usize) -> bool {
    witness_matches && 2 * (live_keys as i128) > record_count as i128 - 2
}

/// Encodes a complete database image: header, witness chunk, record chunks.
///
/// Records appear in the map's iteration order.
///
/// # Errors
///
/// Returns an error if the witness or any record fails to encode.
pub fn encode_snapshot<W: Witness>(
    header: &[u8],
    witness: &W,
    map: &DatabaseMap<W::Key, W::Value>,
) -> CoreResult<Vec<u8>> {
    let mut out = header.to_vec();
    write_chunk(&mut out, &witness.encode()?)?;
    for (key, value) in map {
        write_chunk(&mut out, &witness.encode_record(key, Some(value))?)?;
    }
    Ok(out)
}

/// Rewrites the database from `map`, consuming the previous handle.
///
/// Returns the handle to the freshly written primary, positioned at its end.
///
/// # Errors
///
/// Returns an error if encoding fails or any file operation fails. The
/// backup is left in place on failure.
pub fn rewrite<W: Witness>(
    previous: FileBackend,
    paths: &StoragePaths,
    header: &[u8],
    witness: &W,
    map: &DatabaseMap<W::Key, W::Value>,
) -> CoreResult<FileBackend> {
    let snapshot = encode_snapshot(header, witness, map)?;
    drop(previous);

    paths.move_to_backup()?;

    let mut backend = FileBackend::create(paths.database())?;
    backend.append(&snapshot)?;
    backend.sync()?;

    paths.remove_backup()?;

    debug!(
        path = %paths.database().display(),
        records = map.len(),
        bytes = snapshot.len(),
        "rewrote database"
    );
    Ok(backend)
}
