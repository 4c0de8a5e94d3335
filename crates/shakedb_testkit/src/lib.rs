//! # ShakeDB Testkit
//!
//! Test utilities for ShakeDB.
//!
//! This crate provides:
//! - Temporary database fixtures with captured log output
//! - Crash simulation: torn appends and interrupted compactions
//! - Property-based generators for update sequences
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shakedb_testkit::prelude::*;
//!
//! let db = TestDatabase::new();
//! let storage = db.open(test_witness(1));
//! storage.journal.insert(&"a".to_string(), &1).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
