//! Crash simulation for ShakeDB.
//!
//! Crashes are simulated by leaving files in the exact states a killed
//! process can leave behind:
//!
//! 1. **Torn append** - the file ends part-way through a chunk
//! 2. **Interrupted compaction** - the backup exists next to a missing,
//!    empty, or partially written primary
//!
//! [`CrashableBackend`] produces torn appends through the real journal.

use shakedb_codec::split_chunks;
use shakedb_core::StoragePaths;
use shakedb_storage::{StorageBackend, StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// State of the primary file when a compaction is interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryState {
    /// Killed after the rename, before the new primary was created.
    Missing,
    /// Killed right after the new primary was created.
    Empty,
    /// Killed part-way through writing the new primary.
    Partial(Vec<u8>),
    /// Primary overwritten with unrelated bytes.
    Corrupt(Vec<u8>),
}

/// Truncates the file at `path` to `len` bytes.
pub fn truncate_file(path: &Path, len: u64) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()
}

/// Appends raw bytes to the file at `path`.
pub fn append_garbage(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Returns the offsets at which each chunk after the header ends.
///
/// The first entry is the end of the witness chunk.
pub fn chunk_boundaries(contents: &[u8], header_len: usize) -> Vec<u64> {
    let mut offset = header_len as u64;
    split_chunks(&contents[header_len..])
        .chunks
        .iter()
        .map(|chunk| {
            offset += 4 + chunk.len() as u64;
            offset
        })
        .collect()
}

/// Leaves `paths` as a compaction killed with the primary in `state`.
///
/// The current primary becomes the backup, exactly as the first step of a
/// real compaction does.
pub fn stage_interrupted_compaction(paths: &StoragePaths, state: PrimaryState) -> io::Result<()> {
    fs::rename(paths.database(), paths.backup())?;
    match state {
        PrimaryState::Missing => Ok(()),
        PrimaryState::Empty => fs::write(paths.database(), b""),
        PrimaryState::Partial(bytes) | PrimaryState::Corrupt(bytes) => {
            fs::write(paths.database(), bytes)
        }
    }
}

/// A storage backend wrapper that can simulate a crash mid-write.
///
/// Once the byte budget set by [`CrashableBackend::crash_after`] runs out,
/// the write is cut short at that byte and every later operation fails.
pub struct CrashableBackend {
    inner: Box<dyn StorageBackend>,
    state: Arc<CrashState>,
}

#[derive(Debug)]
struct CrashState {
    crash_after_bytes: AtomicUsize,
    bytes_written: AtomicUsize,
    crashed: AtomicBool,
}

/// Handle for arming and inspecting a [`CrashableBackend`] after it has been
/// handed to a journal.
#[derive(Debug, Clone)]
pub struct CrashSwitch {
    state: Arc<CrashState>,
}

impl CrashableBackend {
    /// Wraps `inner`, returning the backend and a switch to control it.
    pub fn new(inner: Box<dyn StorageBackend>) -> (Self, CrashSwitch) {
        let state = Arc::new(CrashState {
            crash_after_bytes: AtomicUsize::new(usize::MAX),
            bytes_written: AtomicUsize::new(0),
            crashed: AtomicBool::new(false),
        });
        let switch = CrashSwitch {
            state: Arc::clone(&state),
        };
        (Self { inner, state }, switch)
    }

    fn crashed_error(what: &str) -> StorageError {
        StorageError::Io(io::Error::new(io::ErrorKind::Other, what.to_string()))
    }
}

impl CrashSwitch {
    /// Crash once `bytes` more bytes have been appended.
    pub fn crash_after(&self, bytes: usize) {
        let written = self.state.bytes_written.load(Ordering::SeqCst);
        self.state
            .crash_after_bytes
            .store(written.saturating_add(bytes), Ordering::SeqCst);
    }

    /// Returns whether the simulated crash has happened.
    pub fn has_crashed(&self) -> bool {
        self.state.crashed.load(Ordering::SeqCst)
    }
}

impl StorageBackend for CrashableBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        if self.state.crashed.load(Ordering::SeqCst) {
            return Err(Self::crashed_error("backend already crashed"));
        }

        let current = self.state.bytes_written.fetch_add(bytes.len(), Ordering::SeqCst);
        let threshold = self.state.crash_after_bytes.load(Ordering::SeqCst);

        if current + bytes.len() > threshold {
            self.state.crashed.store(true, Ordering::SeqCst);
            let partial_len = threshold.saturating_sub(current);
            if partial_len > 0 {
                self.inner.append(&bytes[..partial_len])?;
                self.inner.sync()?;
            }
            return Err(Self::crashed_error("simulated crash during write"));
        }

        self.inner.append(bytes)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        if self.state.crashed.load(Ordering::SeqCst) {
            return Err(Self::crashed_error("backend already crashed"));
        }
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }
}
