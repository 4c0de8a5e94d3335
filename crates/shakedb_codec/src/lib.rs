//! # ShakeDB Codec
//!
//! Framing and schema witnesses for the ShakeDB journal.
//!
//! - [`encode_chunk`] / [`split_chunks`]: the length-prefixed chunk format
//!   every record travels in
//! - [`Witness`]: the caller-supplied descriptor that encodes and decodes
//!   records, compared by structural equality
//! - [`CborWitness`]: a witness for any `serde` key and value types
//!
//! ## Usage
//!
//! ```
//! use shakedb_codec::{encode_chunk, split_chunks, CborWitness, Witness};
//!
//! let witness = CborWitness::<String, u32>::named(1);
//! let record = witness.encode_record(&"out/main.o".to_string(), Some(&42)).unwrap();
//!
//! let mut file = encode_chunk(&record).unwrap();
//! file.extend_from_slice(&[1, 0]); // half-written length prefix
//!
//! let split = split_chunks(&file);
//! assert_eq!(split.chunks.len(), 1);
//! assert_eq!(split.slop, 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod chunk;
mod error;
mod witness;

pub use cbor::CborWitness;
pub use chunk::{encode_chunk, split_chunks, write_chunk, ChunkSplit, LENGTH_PREFIX_SIZE};
pub use error::{CodecError, CodecResult};
pub use witness::{witness_matches, Witness};
