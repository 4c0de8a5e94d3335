//! Dump command implementation.

use super::{format_value, parse_layout, read_database, to_hex, Source};
use serde::Serialize;
use std::path::Path;

/// A dumped record.
#[derive(Debug, Serialize)]
pub struct DumpedRecord {
    /// Position among record chunks.
    pub index: usize,
    /// File offset of the chunk.
    pub offset: u64,
    /// Payload size in bytes.
    pub size: usize,
    /// Decoded key, if the record decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Decoded value; absent for tombstones and undecodable records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Whether this record deletes its key.
    pub tombstone: bool,
    /// Raw payload, for records that did not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

/// Runs the dump command.
pub fn run(prefix: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = read_database(prefix)?;
    let layout = parse_layout(&file.bytes);
    if layout.header.is_none() {
        return Err("file does not start with a database header".into());
    }

    let records: Vec<DumpedRecord> = layout
        .records
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, record)| match &record.decoded {
            Ok((key, value)) => DumpedRecord {
                index,
                offset: record.offset,
                size: record.payload.len(),
                key: Some(format_value(key)),
                value: value.as_ref().map(format_value),
                tombstone: value.is_none(),
                hex: None,
            },
            Err(_) => DumpedRecord {
                index,
                offset: record.offset,
                size: record.payload.len(),
                key: None,
                value: None,
                tombstone: false,
                hex: Some(to_hex(record.payload)),
            },
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            if file.source == Source::Backup {
                println!("Reading backup {:?}: compaction was interrupted", file.path());
                println!();
            }
            for record in &records {
                print_record(record);
            }
            println!();
            println!("Dumped {} of {} records", records.len(), layout.records.len());
            if layout.slop > 0 {
                println!("{} bytes of slop after the last record", layout.slop);
            }
        }
    }

    Ok(())
}

fn print_record(record: &DumpedRecord) {
    match (&record.key, &record.hex) {
        (Some(key), _) if record.tombstone => {
            println!("#{:<5} @{:<8} {} = <deleted>", record.index, record.offset, key);
        }
        (Some(key), _) => {
            let value = record.value.as_deref().unwrap_or_default();
            println!("#{:<5} @{:<8} {} = {}", record.index, record.offset, key, value);
        }
        (None, hex) => {
            println!(
                "#{:<5} @{:<8} <{} bytes> {}",
                record.index,
                record.offset,
                record.size,
                hex.as_deref().unwrap_or_default()
            );
        }
    }
}
