//! Database configuration.

use crate::dir::StoragePaths;
use std::path::PathBuf;

/// Prefix used when none is given: `.shake/.shake.database`.
pub const DEFAULT_PREFIX: &str = ".shake/.shake";

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path prefix; the primary file is `<prefix>.database` and the backup
    /// is `<prefix>.bup`.
    pub prefix: PathBuf,

    /// Caller version embedded in the header. Changing it discards the
    /// stored database.
    pub user_version: i64,

    /// Whether every update is synced to disk before returning.
    pub sync_on_write: bool,

    /// Whether to create the parent directory of `prefix` if missing.
    pub create_dirs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from(DEFAULT_PREFIX),
            user_version: 0,
            sync_on_write: true,
            create_dirs: true,
        }
    }
}

impl Config {
    /// Creates a configuration for the given prefix with default values.
    #[must_use]
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Sets the caller version embedded in the header.
    #[must_use]
    pub const fn user_version(mut self, version: i64) -> Self {
        self.user_version = version;
        self
    }

    /// Sets whether to sync on every update.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether to create the parent directory.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Returns the primary and backup paths derived from the prefix.
    #[must_use]
    pub fn paths(&self) -> StoragePaths {
        StoragePaths::from_prefix(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.prefix, Path::new(DEFAULT_PREFIX));
        assert_eq!(config.user_version, 0);
        assert!(config.sync_on_write);
        assert!(config.create_dirs);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new("out/build")
            .user_version(7)
            .sync_on_write(false)
            .create_dirs(false);

        assert_eq!(config.prefix, Path::new("out/build"));
        assert_eq!(config.user_version, 7);
        assert!(!config.sync_on_write);
        assert!(!config.create_dirs);
        assert_eq!(config.paths().database(), Path::new("out/build.database"));
    }
}
