//! # ShakeDB Storage
//!
//! Byte-store backends for the ShakeDB journal.
//!
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store. Headers, chunk framing and witnesses all live in
//! `shakedb_codec` and `shakedb_core`.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - Persistent storage using OS file APIs
//! - [`InMemoryBackend`] - For testing
//!
//! ## Example
//!
//! ```rust
//! use shakedb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
