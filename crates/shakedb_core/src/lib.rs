//! # ShakeDB Core
//!
//! A crash-resilient, append-only key/value journal for incremental build
//! metadata.
//!
//! ## File format
//!
//! ```text
//! SHAKE-DATABASE-4-<user_version>\r\n   header
//! | len | witness |                      first chunk
//! | len | record  | ...                  one chunk per update
//! ```
//!
//! ## Lifecycle
//!
//! - Startup ([`open_storage`] / [`with_storage`]) restores an interrupted
//!   compaction, replays the file, then truncates trailing slop, compacts,
//!   or starts empty.
//! - Afterwards the caller owns the map and records changes through
//!   [`Journal::update`], one durable chunk per call.
//!
//! ## Invariants
//!
//! - A file cut at any byte replays to the records before the cut
//! - A backup file exists only while a compaction is in progress
//! - Decode failures rebuild the database; I/O failures are returned

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compaction;
mod config;
mod database;
pub mod dir;
mod error;
pub mod header;
mod journal;
pub mod recovery;
pub mod replay;

pub use config::{Config, DEFAULT_PREFIX};
pub use database::{open_storage, with_storage, Storage};
pub use dir::StoragePaths;
pub use header::{database_header, parse_header, ParsedHeader};
pub use error::{CoreError, CoreResult};
pub use journal::Journal;
pub use recovery::{StartupAction, StartupReport};
pub use replay::{replay, DatabaseMap, ReplayKind, ReplayOutcome};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
