//! Test fixtures and database helpers.

use parking_lot::Mutex;
use shakedb_codec::{split_chunks, CborWitness};
use shakedb_core::header::database_header;
use shakedb_core::{open_storage, Config, Storage, StoragePaths};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Witness used throughout the test suite.
pub type TestWitness = CborWitness<String, u64>;

/// Builds the test witness at the given revision.
pub fn test_witness(revision: u32) -> TestWitness {
    TestWitness::new("String", "u64", revision)
}

/// A database location in a temporary directory, reopenable at will.
///
/// Every message sent to the logger is captured for assertions.
pub struct TestDatabase {
    prefix: PathBuf,
    user_version: i64,
    messages: Arc<Mutex<Vec<String>>>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Creates a location in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            prefix: temp_dir.path().join("nested").join(".shake"),
            user_version: 1,
            messages: Arc::new(Mutex::new(Vec::new())),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the path prefix.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Returns the primary and backup paths.
    pub fn paths(&self) -> StoragePaths {
        StoragePaths::from_prefix(&self.prefix)
    }

    /// Returns the header this fixture writes.
    pub fn header(&self) -> Vec<u8> {
        database_header(self.user_version)
    }

    /// Opens the database with the fixture's user version.
    pub fn open(&self, witness: TestWitness) -> Storage<TestWitness> {
        self.open_with_version(self.user_version, witness)
    }

    /// Opens the database with an explicit user version.
    pub fn open_with_version(&self, user_version: i64, witness: TestWitness) -> Storage<TestWitness> {
        let messages = Arc::clone(&self.messages);
        let config = Config::new(&self.prefix).user_version(user_version);
        open_storage(
            move |msg: &str| messages.lock().push(msg.to_string()),
            &config,
            witness,
        )
        .expect("Failed to open database")
    }

    /// Returns every message logged so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Returns the primary file's bytes.
    pub fn file_bytes(&self) -> Vec<u8> {
        std::fs::read(self.paths().database()).expect("Failed to read database file")
    }

    /// Returns the primary file's length.
    pub fn file_len(&self) -> u64 {
        std::fs::metadata(self.paths().database())
            .expect("Failed to stat database file")
            .len()
    }

    /// Counts record chunks in the primary file, excluding the witness.
    pub fn record_chunks(&self) -> usize {
        let bytes = self.file_bytes();
        let body = bytes
            .strip_prefix(self.header().as_slice())
            .expect("Database file lacks the expected header");
        split_chunks(body).chunks.len().saturating_sub(1)
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_header_and_witness_only() {
        let db = TestDatabase::new();
        let storage = db.open(test_witness(1));

        assert!(storage.map.is_empty());
        assert!(db.file_bytes().starts_with(&db.header()));
        assert_eq!(db.record_chunks(), 0);
        assert!(db.messages().is_empty());
    }

    #[test]
    fn parent_directory_is_created() {
        let db = TestDatabase::new();
        let _storage = db.open(test_witness(1));
        assert!(db.paths().parent().is_dir());
    }
}
