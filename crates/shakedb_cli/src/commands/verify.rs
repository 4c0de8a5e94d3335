//! Verify command implementation.
//!
//! Checks that the next startup with `user_version` would load the file
//! as-is: the header matches exactly and every chunk decodes with the stored
//! witness. Slop and a leftover backup are reported but do not fail
//! verification, since startup repairs both.

use super::{parse_layout, read_database, DatabaseFile, Source};
use shakedb_core::database_header;
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of valid records.
    pub valid_records: usize,
    /// Number of corrupt records.
    pub corrupt_records: usize,
    /// Problems that make startup discard the file.
    pub errors: Vec<String>,
    /// Conditions startup repairs without data loss.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.corrupt_records == 0 && self.errors.is_empty()
    }
}

/// Checks `bytes` as a database expected to carry `user_version`.
pub fn verify_bytes(bytes: &[u8], user_version: i64) -> VerifyResult {
    let mut result = VerifyResult::default();

    let expected = database_header(user_version);
    if !bytes.starts_with(&expected) {
        let found = parse_layout(bytes)
            .header
            .map(|h| format!("format {} user version {}", h.format_version, h.user_version));
        result.errors.push(format!(
            "header mismatch: expected user version {user_version}, found {}",
            found.unwrap_or_else(|| "no valid header".to_string())
        ));
        return result;
    }

    let layout = parse_layout(bytes);
    match &layout.witness {
        None => result.warnings.push("no witness chunk; startup will rewrite the file".to_string()),
        Some(Err(e)) => result.errors.push(format!("witness does not decode: {e}")),
        Some(Ok(_)) => {}
    }

    for record in &layout.records {
        result.records_checked += 1;
        match &record.decoded {
            Ok(_) => result.valid_records += 1,
            Err(e) => {
                result.corrupt_records += 1;
                result
                    .errors
                    .push(format!("record at offset {}: {e}", record.offset));
            }
        }
    }

    if layout.slop > 0 {
        result.warnings.push(format!(
            "{} trailing bytes will be truncated at startup",
            layout.slop
        ));
    }

    result
}

/// Checks the file startup would replay, noting when that is a backup.
pub fn verify_database(file: &DatabaseFile, user_version: i64) -> VerifyResult {
    let mut result = verify_bytes(&file.bytes, user_version);
    if file.source == Source::Backup {
        result.warnings.push(format!(
            "compaction was interrupted; startup will restore {:?} over {:?}",
            file.paths.backup(),
            file.paths.database()
        ));
    }
    result
}

/// Runs the verify command.
pub fn run(prefix: &Path, user_version: i64) -> Result<(), Box<dyn std::error::Error>> {
    let file = read_database(prefix)?;
    println!("Verifying {} at {:?}", file.source, file.path());
    println!();

    let result = verify_database(&file, user_version);
    print_result(&result);

    if result.is_ok() {
        println!("✓ Verification passed");
        Ok(())
    } else {
        Err(format!("verification failed with {} error(s)", result.errors.len()).into())
    }
}

fn print_result(result: &VerifyResult) {
    println!("  Records checked: {}", result.records_checked);
    println!("  Valid records:   {}", result.valid_records);
    println!("  Corrupt records: {}", result.corrupt_records);

    for warning in &result.warnings {
        println!("  Warning: {warning}");
    }
    for error in &result.errors {
        println!("  Error: {error}");
    }
    println!();
}
