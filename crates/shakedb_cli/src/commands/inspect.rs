//! Inspect command implementation.

use super::{parse_layout, read_database, Source};
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Primary journal path.
    pub path: String,
    /// File that was inspected: `database`, or `backup` after an
    /// interrupted compaction.
    pub source: String,
    /// Size of the inspected file in bytes.
    pub size: u64,
    /// Whether a compaction backup is present.
    pub backup_present: bool,
    /// Size of the primary file when the backup was inspected instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_size: Option<u64>,
    /// Format version from the header.
    pub format_version: Option<u32>,
    /// User version from the header.
    pub user_version: Option<i64>,
    /// Stored witness, rendered.
    pub witness: Option<String>,
    /// Number of record chunks.
    pub record_count: usize,
    /// Live keys after folding, if every record decoded.
    pub live_keys: Option<usize>,
    /// Records that failed to decode.
    pub undecodable: usize,
    /// Trailing bytes past the last complete chunk.
    pub slop: u64,
}

/// Runs the inspect command.
pub fn run(prefix: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = read_database(prefix)?;
    let layout = parse_layout(&file.bytes);
    let backup_present = file.source == Source::Backup;

    let superseded_size = if backup_present && file.paths.database().exists() {
        Some(std::fs::metadata(file.paths.database())?.len())
    } else {
        None
    };

    let result = InspectResult {
        path: file.paths.database().display().to_string(),
        source: file.source.to_string(),
        size: file.bytes.len() as u64,
        backup_present,
        superseded_size,
        format_version: layout.header.map(|h| h.format_version),
        user_version: layout.header.map(|h| h.user_version),
        witness: layout.witness.as_ref().map(|w| match w {
            Ok(w) => format!(
                "{} -> {} (revision {})",
                w.key_type(),
                w.value_type(),
                w.revision()
            ),
            Err(e) => format!("unreadable: {e}"),
        }),
        record_count: layout.records.len(),
        live_keys: layout.live_keys(),
        undecodable: layout.undecodable(),
        slop: layout.slop,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_text_output(result: &InspectResult) {
    println!("ShakeDB Database Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Files:");
    println!("  Inspected:     {}", result.source);
    println!("  Size:          {}", format_size(result.size));
    if result.backup_present {
        println!("  Backup:        present (compaction interrupted, startup restores it)");
        println!("  Superseded:    {}", or_missing(result.superseded_size.map(format_size)));
    } else {
        println!("  Backup:        none");
    }
    println!();
    println!("Header:");
    println!("  Format version: {}", or_missing(result.format_version));
    println!("  User version:   {}", or_missing(result.user_version));
    println!("  Witness:        {}", or_missing(result.witness.as_ref()));
    println!();
    println!("Records:");
    println!("  Chunks:      {}", result.record_count);
    println!("  Live keys:   {}", or_missing(result.live_keys));
    println!("  Undecodable: {}", result.undecodable);
    println!("  Slop:        {} bytes", result.slop);
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
