//! Entry points: open a database and get its map plus a journal.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::header::database_header;
use crate::journal::Journal;
use crate::recovery::{recover, Recovered, StartupReport};
use crate::replay::DatabaseMap;
use shakedb_codec::Witness;
use std::hash::Hash;
use std::path::Path;
use tracing::info;

/// An opened database.
///
/// The map belongs to the caller. The engine never touches it again; the
/// caller mirrors its own changes to disk through [`Storage::journal`].
pub struct Storage<W: Witness> {
    /// The reconstructed map.
    pub map: DatabaseMap<W::Key, W::Value>,
    /// The append path.
    pub journal: Journal<W>,
    /// What startup did.
    pub report: StartupReport,
}

/// Opens the database described by `config`.
///
/// Format problems are reported through `logger` and resolved by starting
/// from an empty map. Only I/O and encoding failures are returned.
///
/// # Errors
///
/// Returns an error if the prefix is empty or a file operation fails.
pub fn open_storage<W, L>(logger: L, config: &Config, witness: W) -> CoreResult<Storage<W>>
where
    W: Witness,
    W::Key: Eq + Hash,
    L: Fn(&str),
{
    if config.prefix.as_os_str().is_empty() {
        return Err(CoreError::invalid_operation("database prefix is empty"));
    }

    let paths = config.paths();
    if config.create_dirs {
        paths.ensure_parent_dir()?;
    }

    let header = database_header(config.user_version);
    let Recovered {
        backend,
        map,
        report,
    } = recover(&logger, &paths, &header, &witness)?;

    info!(
        path = %paths.database().display(),
        keys = map.len(),
        action = ?report.action,
        "opened database"
    );

    Ok(Storage {
        map,
        journal: Journal::new(Box::new(backend), witness, config.sync_on_write),
        report,
    })
}

/// Opens the database at `prefix` and runs `body` with its map and journal.
///
/// The primary file is `<prefix>.database`; a compaction in progress uses
/// `<prefix>.bup`. Changing `user_version` discards the stored data.
///
/// ```no_run
/// use shakedb_codec::CborWitness;
/// use shakedb_core::with_storage;
///
/// let witness = CborWitness::<String, u64>::named(1);
/// let total = with_storage(|msg| eprintln!("{msg}"), ".shake/.shake", 1, witness, |map, journal| {
///     journal.insert(&"main.o".to_string(), &42).unwrap();
///     map.len()
/// })
/// .unwrap();
/// # let _ = total;
/// ```
///
/// # Errors
///
/// Returns an error if a file operation fails during startup.
pub fn with_storage<W, L, A, F>(
    logger: L,
    prefix: impl AsRef<Path>,
    user_version: i64,
    witness: W,
    body: F,
) -> CoreResult<A>
where
    W: Witness,
    W::Key: Eq + Hash,
    L: Fn(&str),
    F: FnOnce(DatabaseMap<W::Key, W::Value>, &Journal<W>) -> A,
{
    let config = Config::new(prefix.as_ref()).user_version(user_version);
    let Storage { map, journal, .. } = open_storage(logger, &config, witness)?;
    Ok(body(map, &journal))
}
