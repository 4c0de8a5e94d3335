//! CLI command implementations.
//!
//! Every command is read-only. Files are parsed into a [`Layout`] without
//! running recovery, so the tools show exactly what the next startup would
//! see. A compaction backup, when present, is read instead of the primary
//! because startup restores it before replaying anything.

pub mod dump;
pub mod inspect;
pub mod verify;

use ciborium::Value;
use shakedb_codec::{split_chunks, CborWitness, Witness, LENGTH_PREFIX_SIZE};
use shakedb_core::{parse_header, ParsedHeader, StoragePaths};
use shakedb_storage::{FileBackend, StorageBackend};
use std::fmt;
use std::path::Path;

/// A witness able to read any file written with `CborWitness`.
pub type AnyWitness = CborWitness<Value, Value>;

/// A decoded record: key and value, `None` for a tombstone.
pub type DecodedRecord = (Value, Option<Value>);

/// One record chunk and where it sits in the file.
#[derive(Debug)]
pub struct RecordChunk<'a> {
    /// Offset of the length prefix.
    pub offset: u64,
    /// Record payload.
    pub payload: &'a [u8],
    /// Decoded record, or the decode error.
    pub decoded: Result<DecodedRecord, String>,
}

/// The parsed structure of a database file.
#[derive(Debug)]
pub struct Layout<'a> {
    /// Header, if the file starts with one.
    pub header: Option<ParsedHeader>,
    /// Stored witness, or why it could not be read. `None` without a
    /// witness chunk.
    pub witness: Option<Result<AnyWitness, String>>,
    /// Record chunks after the witness.
    pub records: Vec<RecordChunk<'a>>,
    /// Trailing bytes that do not form a complete chunk.
    pub slop: u64,
}

impl Layout<'_> {
    /// Number of live keys after folding every decodable record, if all of
    /// them decoded.
    pub fn live_keys(&self) -> Option<usize> {
        let mut live = Vec::<&Value>::new();
        for record in &self.records {
            let (key, value) = record.decoded.as_ref().ok()?;
            let existing = live.iter().position(|k| *k == key);
            match (existing, value) {
                (None, Some(_)) => live.push(key),
                (Some(i), None) => {
                    live.swap_remove(i);
                }
                _ => {}
            }
        }
        Some(live.len())
    }

    /// Number of records that failed to decode.
    pub fn undecodable(&self) -> usize {
        self.records.iter().filter(|r| r.decoded.is_err()).count()
    }
}

/// Splits `bytes` into header, witness and records.
pub fn parse_layout(bytes: &[u8]) -> Layout<'_> {
    let Some(header) = parse_header(bytes) else {
        return Layout {
            header: None,
            witness: None,
            records: Vec::new(),
            slop: 0,
        };
    };

    let split = split_chunks(&bytes[header.len..]);
    let mut chunks = split.chunks.into_iter();
    let mut offset = header.len as u64;

    let Some(first) = chunks.next() else {
        return Layout {
            header: Some(header),
            witness: None,
            records: Vec::new(),
            slop: split.slop,
        };
    };
    offset += (LENGTH_PREFIX_SIZE + first.len()) as u64;
    let witness = AnyWitness::decode(first).map_err(|e| e.to_string());

    let records = chunks
        .map(|payload| {
            let decoded = match &witness {
                Ok(witness) => witness.decode_record(payload).map_err(|e| e.to_string()),
                Err(_) => Err("stored witness is unreadable".to_string()),
            };
            let chunk = RecordChunk {
                offset,
                payload,
                decoded,
            };
            offset += (LENGTH_PREFIX_SIZE + payload.len()) as u64;
            chunk
        })
        .collect();

    Layout {
        header: Some(header),
        witness: Some(witness),
        records,
        slop: split.slop,
    }
}

/// Which file of a database was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The primary journal.
    Primary,
    /// The backup of an interrupted compaction.
    Backup,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("database"),
            Self::Backup => f.write_str("backup"),
        }
    }
}

/// The contents startup would replay for a prefix.
#[derive(Debug)]
pub struct DatabaseFile {
    /// Primary and backup paths.
    pub paths: StoragePaths,
    /// The file `bytes` came from.
    pub source: Source,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl DatabaseFile {
    /// Path of the file that was read.
    pub fn path(&self) -> &Path {
        match self.source {
            Source::Primary => self.paths.database(),
            Source::Backup => self.paths.backup(),
        }
    }
}

/// Reads what the next startup would replay for `prefix`, without
/// modifying or creating any file.
///
/// The backup wins over the primary, whatever state the primary is in.
pub fn read_database(prefix: &Path) -> Result<DatabaseFile, Box<dyn std::error::Error>> {
    let paths = StoragePaths::from_prefix(prefix);
    let source = if paths.has_backup() {
        Source::Backup
    } else if paths.database().exists() {
        Source::Primary
    } else {
        return Err(format!("No database found at {:?}", paths.database()).into());
    };

    let mut file = DatabaseFile {
        paths,
        source,
        bytes: Vec::new(),
    };
    let backend = FileBackend::open_read_only(file.path())?;
    file.bytes = backend.read_all()?;
    Ok(file)
}

/// Renders a CBOR value on one line.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("{s:?}"),
        Value::Integer(i) => i128::from(*i).to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Null => "null".to_string(),
        Value::Bytes(b) => format!("h'{}'", to_hex(b)),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", format_value(k), format_value(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        other => format!("{other:?}"),
    }
}

/// Lowercase hex without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
