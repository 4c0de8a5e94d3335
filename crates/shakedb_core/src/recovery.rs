//! Startup recovery.
//!
//! Runs once per process, before any update:
//!
//! 1. Restore the backup of an interrupted compaction, if any.
//! 2. Read the whole primary file and replay it.
//! 3. Accept the log (dropping trailing slop), compact it, or start empty.
//! 4. An empty map always gets a fresh header + witness file.
//!
//! Format problems are reported through the caller's logger and never
//! returned as errors. I/O failures are.

use crate::compaction::{log_is_compact, rewrite};
use crate::dir::StoragePaths;
use crate::error::CoreResult;
use crate::header::header_excerpt;
use crate::replay::{replay, DatabaseMap, ReplayKind, ReplayOutcome};
use shakedb_codec::Witness;
use shakedb_storage::{FileBackend, StorageBackend};
use std::hash::Hash;
use tracing::{debug, info, warn};

/// What startup did to the file before handing it to the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// The log was reused unchanged.
    Accepted,
    /// The log was reused after dropping a partially written tail.
    Truncated {
        /// Number of bytes removed.
        slop: u64,
    },
    /// The log was rewritten with one record per live key.
    Compacted,
    /// The file was rewritten as header + witness with no records.
    Reset,
}

/// Summary of a startup, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Whether a backup from an interrupted compaction was restored.
    pub restored_backup: bool,
    /// What replay found.
    pub replay: ReplayKind,
    /// What was done about it.
    pub action: StartupAction,
    /// Record chunks found in the file, excluding the witness chunk.
    pub record_count: usize,
    /// Live keys handed to the caller.
    pub live_keys: usize,
    /// Trailing bytes after the last complete chunk.
    pub slop: u64,
}

/// Result of a successful recovery.
#[derive(Debug)]
pub struct Recovered<K, V> {
    /// Handle to the primary file, positioned for appends.
    pub backend: FileBackend,
    /// The reconstructed map.
    pub map: DatabaseMap<K, V>,
    /// What happened.
    pub report: StartupReport,
}

/// Brings the database at `paths` into a state ready for appends.
///
/// # Errors
///
/// Returns an error if any file operation fails or a record cannot be
/// encoded during a rewrite.
pub fn recover<W, L>(
    logger: &L,
    paths: &StoragePaths,
    header: &[u8],
    witness: &W,
) -> CoreResult<Recovered<W::Key, W::Value>>
where
    W: Witness,
    W::Key: Eq + Hash,
    L: Fn(&str) + ?Sized,
{
    let restored_backup = paths.restore_backup()?;

    let mut backend = FileBackend::open(paths.database())?;
    let contents = backend.read_all()?;
    let outcome = replay(&contents, header, witness);

    let mut report = StartupReport {
        restored_backup,
        replay: outcome.kind(),
        action: StartupAction::Accepted,
        record_count: 0,
        live_keys: 0,
        slop: 0,
    };

    let map = match outcome {
        ReplayOutcome::HeaderMismatch { found } => {
            if contents.is_empty() {
                debug!(path = %paths.database().display(), "creating new database");
            } else {
                warn!(expected = %header_excerpt(header), %found, "database header mismatch");
                logger(&format!(
                    "Error when reading database - invalid version stamp detected\n  \
                     File:     {}\n  \
                     Expected: {}\n  \
                     Found:    {}\n\
                     All files will be rebuilt",
                    paths.database().display(),
                    header_excerpt(header),
                    found,
                ));
            }
            DatabaseMap::new()
        }
        ReplayOutcome::ParseFailure { message } => {
            warn!(error = %message, "database contents could not be decoded");
            logger(&format!(
                "Error when reading database - invalid data stored\n  \
                 File:  {}\n  \
                 Error: {}\n\
                 All files will be rebuilt",
                paths.database().display(),
                message,
            ));
            DatabaseMap::new()
        }
        ReplayOutcome::Empty { slop } => {
            report.slop = slop;
            DatabaseMap::new()
        }
        ReplayOutcome::Loaded {
            witness_matches,
            slop,
            record_count,
            map,
        } => {
            report.record_count = record_count;
            report.slop = slop;

            if map.is_empty() {
                // falls through to the reset below
            } else if log_is_compact(witness_matches, map.len(), record_count) {
                if slop > 0 {
                    let size = backend.size()?;
                    backend.truncate(size - slop)?;
                    report.action = StartupAction::Truncated { slop };
                    info!(slop, "dropped partially written tail");
                }
            } else {
                info!(
                    witness_matches,
                    records = record_count,
                    live = map.len(),
                    "compacting database"
                );
                backend = rewrite(backend, paths, header, witness, &map)?;
                report.action = StartupAction::Compacted;
            }
            map
        }
    };

    if map.is_empty() {
        backend = rewrite(backend, paths, header, witness, &map)?;
        report.action = StartupAction::Reset;
    }

    report.live_keys = map.len();
    debug!(?report, "database ready");

    Ok(Recovered {
        backend,
        map,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compaction::encode_snapshot;
    use crate::header::database_header;
    use parking_lot::Mutex;
    use shakedb_codec::{write_chunk, CborWitness};
    use std::fs;
    use tempfile::tempdir;

    type TestWitness = CborWitness<String, u64>;

    fn setup() -> (tempfile::TempDir, StoragePaths) {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("db"));
        (dir, paths)
    }

    fn append_records(paths: &StoragePaths, witness: &TestWitness, records: &[(&str, Option<u64>)]) {
        let mut bytes = fs::read(paths.database()).unwrap();
        for (key, value) in records {
            let record = witness
                .encode_record(&(*key).to_string(), value.as_ref())
                .unwrap();
            write_chunk(&mut bytes, &record).unwrap();
        }
        fs::write(paths.database(), bytes).unwrap();
    }

    #[test]
    fn fresh_database_is_reset_silently() {
        let (_dir, paths) = setup();
        let messages = Mutex::new(Vec::<String>::new());
        let logger = |m: &str| messages.lock().push(m.to_string());

        let header = database_header(1);
        let witness = TestWitness::named(1);
        let recovered = recover(&logger, &paths, &header, &witness).unwrap();

        assert!(recovered.map.is_empty());
        assert_eq!(recovered.report.replay, ReplayKind::HeaderMismatch);
        assert_eq!(recovered.report.action, StartupAction::Reset);
        assert!(messages.lock().is_empty());

        let expected = encode_snapshot(&header, &witness, &DatabaseMap::new()).unwrap();
        assert_eq!(fs::read(paths.database()).unwrap(), expected);
    }

    #[test]
    fn garbage_file_is_logged_and_reset() {
        let (_dir, paths) = setup();
        fs::write(paths.database(), b"OTHER-FORMAT 9\r\nrest").unwrap();
        let messages = Mutex::new(Vec::<String>::new());
        let logger = |m: &str| messages.lock().push(m.to_string());

        let recovered =
            recover(&logger, &paths, &database_header(1), &TestWitness::named(1)).unwrap();

        assert!(recovered.map.is_empty());
        let messages = messages.lock();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Expected: SHAKE-DATABASE-4-1"));
        assert!(messages[0].contains("Found:    OTHER-FORMAT 9"));
        assert!(messages[0].ends_with("All files will be rebuilt"));
    }

    #[test]
    fn accepted_log_is_left_alone() {
        let (_dir, paths) = setup();
        let header = database_header(1);
        let witness = TestWitness::named(1);
        recover(&|_: &str| {}, &paths, &header, &witness).unwrap();
        append_records(&paths, &witness, &[("a", Some(1)), ("b", Some(2))]);
        let before = fs::read(paths.database()).unwrap();

        let recovered = recover(&|_: &str| {}, &paths, &header, &witness).unwrap();

        assert_eq!(recovered.report.action, StartupAction::Accepted);
        assert_eq!(recovered.report.record_count, 2);
        assert_eq!(recovered.report.live_keys, 2);
        assert_eq!(fs::read(paths.database()).unwrap(), before);
    }

    #[test]
    fn slop_is_truncated() {
        let (_dir, paths) = setup();
        let header = database_header(1);
        let witness = TestWitness::named(1);
        recover(&|_: &str| {}, &paths, &header, &witness).unwrap();
        append_records(&paths, &witness, &[("a", Some(1))]);
        let clean_len = fs::metadata(paths.database()).unwrap().len();

        let mut bytes = fs::read(paths.database()).unwrap();
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        fs::write(paths.database(), bytes).unwrap();

        let recovered = recover(&|_: &str| {}, &paths, &header, &witness).unwrap();

        assert_eq!(recovered.report.action, StartupAction::Truncated { slop: 2 });
        assert_eq!(fs::metadata(paths.database()).unwrap().len(), clean_len);
        assert_eq!(recovered.backend.size().unwrap(), clean_len);
    }

    #[test]
    fn redundant_log_is_compacted() {
        let (_dir, paths) = setup();
        let header = database_header(1);
        let witness = TestWitness::named(1);
        recover(&|_: &str| {}, &paths, &header, &witness).unwrap();
        let records: Vec<(&str, Option<u64>)> = (0..10).map(|i| ("same", Some(i))).collect();
        append_records(&paths, &witness, &records);

        let recovered = recover(&|_: &str| {}, &paths, &header, &witness).unwrap();

        assert_eq!(recovered.report.action, StartupAction::Compacted);
        assert_eq!(recovered.map["same"], 9);
        let mut single = DatabaseMap::new();
        single.insert("same".to_string(), 9);
        assert_eq!(
            fs::read(paths.database()).unwrap(),
            encode_snapshot(&header, &witness, &single).unwrap()
        );
        assert!(!paths.has_backup());
    }

    #[test]
    fn all_tombstones_reset_the_file() {
        let (_dir, paths) = setup();
        let header = database_header(1);
        let witness = TestWitness::named(1);
        recover(&|_: &str| {}, &paths, &header, &witness).unwrap();
        append_records(&paths, &witness, &[("a", Some(1)), ("a", None)]);

        let recovered = recover(&|_: &str| {}, &paths, &header, &witness).unwrap();

        assert_eq!(recovered.report.replay, ReplayKind::Loaded);
        assert_eq!(recovered.report.action, StartupAction::Reset);
        assert_eq!(recovered.report.record_count, 2);
        assert!(recovered.map.is_empty());
    }

    #[test]
    fn backup_is_restored_before_replay() {
        let (_dir, paths) = setup();
        let header = database_header(1);
        let witness = TestWitness::named(1);
        let mut map = DatabaseMap::new();
        map.insert("kept".to_string(), 1);
        fs::write(paths.backup(), encode_snapshot(&header, &witness, &map).unwrap()).unwrap();
        fs::write(paths.database(), &header[..5]).unwrap();

        let recovered = recover(&|_: &str| {}, &paths, &header, &witness).unwrap();

        assert!(recovered.report.restored_backup);
        assert_eq!(recovered.map, map);
        assert!(!paths.has_backup());
    }
}
