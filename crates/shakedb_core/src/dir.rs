//! File layout of a database.
//!
//! ```text
//! <prefix>.database   # primary journal
//! <prefix>.bup        # backup, present only while a compaction runs
//! ```
//!
//! The backup is a verbatim rename of the primary taken before any
//! destructive write. Finding it at startup means the previous compaction
//! never finished.

use crate::error::CoreResult;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Extension of the primary journal file.
pub const DATABASE_EXTENSION: &str = "database";

/// Extension of the compaction backup file.
pub const BACKUP_EXTENSION: &str = "bup";

/// Primary and backup paths for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    database: PathBuf,
    backup: PathBuf,
}

fn with_suffix(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

impl StoragePaths {
    /// Derives the paths from a prefix by appending the extensions.
    ///
    /// The prefix is extended, not re-extensioned: `out/.shake` becomes
    /// `out/.shake.database`.
    #[must_use]
    pub fn from_prefix(prefix: &Path) -> Self {
        Self {
            database: with_suffix(prefix, DATABASE_EXTENSION),
            backup: with_suffix(prefix, BACKUP_EXTENSION),
        }
    }

    /// Returns the path to the primary journal.
    #[must_use]
    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Returns the path to the compaction backup.
    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Returns the directory holding both files.
    #[must_use]
    pub fn parent(&self) -> &Path {
        match self.database.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Creates the parent directory if it does not exist.
    pub fn ensure_parent_dir(&self) -> CoreResult<()> {
        fs::create_dir_all(self.parent())?;
        Ok(())
    }

    /// Returns true if a compaction backup is present.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup.exists()
    }

    /// Restores the backup left by an interrupted compaction.
    ///
    /// Deletes whatever the primary holds and renames the backup over it.
    /// Returns `false` if there was no backup.
    pub fn restore_backup(&self) -> CoreResult<bool> {
        if !self.has_backup() {
            return Ok(false);
        }

        if self.database.exists() {
            fs::remove_file(&self.database)?;
        }
        fs::rename(&self.backup, &self.database)?;
        self.sync_parent_dir()?;

        info!(
            backup = %self.backup.display(),
            "restored database from interrupted compaction"
        );
        Ok(true)
    }

    /// Moves the primary journal aside as the backup.
    pub fn move_to_backup(&self) -> CoreResult<()> {
        if self.database.exists() {
            fs::rename(&self.database, &self.backup)?;
            self.sync_parent_dir()?;
        }
        Ok(())
    }

    /// Deletes the backup once a rewrite is durable.
    pub fn remove_backup(&self) -> CoreResult<()> {
        if self.has_backup() {
            fs::remove_file(&self.backup)?;
            self.sync_parent_dir()?;
        }
        Ok(())
    }

    /// Syncs the parent directory so renames and deletions are durable.
    #[cfg(unix)]
    pub fn sync_parent_dir(&self) -> CoreResult<()> {
        File::open(self.parent())?.sync_all()?;
        Ok(())
    }

    /// Syncs the parent directory so renames and deletions are durable.
    ///
    /// NTFS journals metadata operations itself; there is no directory
    /// handle to sync on Windows.
    #[cfg(not(unix))]
    pub fn sync_parent_dir(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_extend_prefix() {
        let paths = StoragePaths::from_prefix(Path::new("out/.shake"));
        assert_eq!(paths.database(), Path::new("out/.shake.database"));
        assert_eq!(paths.backup(), Path::new("out/.shake.bup"));
        assert_eq!(paths.parent(), Path::new("out"));
    }

    #[test]
    fn bare_prefix_lives_in_current_dir() {
        let paths = StoragePaths::from_prefix(Path::new("build"));
        assert_eq!(paths.parent(), Path::new("."));
    }

    #[test]
    fn ensure_parent_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("a/b/db"));
        paths.ensure_parent_dir().unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }

    #[test]
    fn restore_without_backup_is_noop() {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("db"));
        fs::write(paths.database(), b"primary").unwrap();

        assert!(!paths.restore_backup().unwrap());
        assert_eq!(fs::read(paths.database()).unwrap(), b"primary");
    }

    #[test]
    fn restore_replaces_partial_primary() {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("db"));
        fs::write(paths.database(), b"half written").unwrap();
        fs::write(paths.backup(), b"complete").unwrap();

        assert!(paths.restore_backup().unwrap());
        assert_eq!(fs::read(paths.database()).unwrap(), b"complete");
        assert!(!paths.has_backup());
    }

    #[test]
    fn restore_with_missing_primary() {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("db"));
        fs::write(paths.backup(), b"complete").unwrap();

        assert!(paths.restore_backup().unwrap());
        assert_eq!(fs::read(paths.database()).unwrap(), b"complete");
    }

    #[test]
    fn move_and_remove_backup() {
        let dir = tempdir().unwrap();
        let paths = StoragePaths::from_prefix(&dir.path().join("db"));
        fs::write(paths.database(), b"data").unwrap();

        paths.move_to_backup().unwrap();
        assert!(!paths.database().exists());
        assert_eq!(fs::read(paths.backup()).unwrap(), b"data");

        paths.remove_backup().unwrap();
        assert!(!paths.has_backup());
    }
}
