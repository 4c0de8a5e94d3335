//! The append path used for the rest of the process's life.

use crate::error::CoreResult;
use parking_lot::Mutex;
use shakedb_codec::{encode_chunk, Witness};
use shakedb_storage::StorageBackend;
use std::sync::Arc;

/// Appends records to an open database.
///
/// Every [`Journal::update`] writes exactly one chunk under a mutex, so
/// chunks from concurrent callers never interleave and the on-disk order is
/// the order in which callers acquired the lock. Clones share the same file
/// handle and lock.
///
/// An update interrupted by process death leaves a partial chunk, which the
/// next startup detects as slop and discards.
pub struct Journal<W: Witness> {
    backend: Arc<Mutex<Box<dyn StorageBackend>>>,
    witness: Arc<W>,
    sync_on_write: bool,
}

impl<W: Witness> Journal<W> {
    /// Creates a journal appending to `backend` with records encoded under
    /// `witness`.
    pub fn new(backend: Box<dyn StorageBackend>, witness: W, sync_on_write: bool) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            witness: Arc::new(witness),
            sync_on_write,
        }
    }

    /// Records that `key` now maps to `value`, or was deleted if `value` is
    /// `None`.
    ///
    /// Returns once the chunk is synced to disk (or handed to the OS when
    /// `sync_on_write` is off).
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn update(&self, key: &W::Key, value: Option<&W::Value>) -> CoreResult<()> {
        let record = self.witness.encode_record(key, value)?;
        let chunk = encode_chunk(&record)?;

        let mut backend = self.backend.lock();
        backend.append(&chunk)?;
        if self.sync_on_write {
            backend.sync()?;
        } else {
            backend.flush()?;
        }
        Ok(())
    }

    /// Records a new value for `key`.
    pub fn insert(&self, key: &W::Key, value: &W::Value) -> CoreResult<()> {
        self.update(key, Some(value))
    }

    /// Records the deletion of `key`.
    pub fn delete(&self, key: &W::Key) -> CoreResult<()> {
        self.update(key, None)
    }

    /// Returns the witness new records are encoded with.
    #[must_use]
    pub fn witness(&self) -> &W {
        &self.witness
    }

    /// Returns the current file size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Syncs the file to disk.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend.lock().sync()?;
        Ok(())
    }
}

impl<W: Witness> Clone for Journal<W> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            witness: Arc::clone(&self.witness),
            sync_on_write: self.sync_on_write,
        }
    }
}

impl<W: Witness> std::fmt::Debug for Journal<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("witness", &self.witness)
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}
