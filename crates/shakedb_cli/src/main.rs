//! ShakeDB CLI
//!
//! Read-only tools for looking at ShakeDB journals on disk.
//!
//! # Commands
//!
//! - `inspect` - Display header, sizes, and record counts
//! - `verify` - Check that a database would load without a rebuild
//! - `dump` - Print every record for debugging

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ShakeDB command-line database tools.
#[derive(Parser)]
#[command(name = "shakedb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, sizes, and record counts
    Inspect {
        /// Database prefix, without the `.database` extension
        #[arg(default_value = shakedb_core::DEFAULT_PREFIX)]
        prefix: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that a database would load without a rebuild
    Verify {
        /// Database prefix, without the `.database` extension
        #[arg(default_value = shakedb_core::DEFAULT_PREFIX)]
        prefix: PathBuf,

        /// User version the database is expected to carry
        #[arg(short, long, allow_negative_numbers = true)]
        user_version: i64,
    },

    /// Print every record for debugging
    Dump {
        /// Database prefix, without the `.database` extension
        #[arg(default_value = shakedb_core::DEFAULT_PREFIX)]
        prefix: PathBuf,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { prefix, format } => {
            tracing::debug!(?prefix, "inspecting database");
            commands::inspect::run(&prefix, &format)?;
        }
        Commands::Verify {
            prefix,
            user_version,
        } => {
            tracing::debug!(?prefix, user_version, "verifying database");
            commands::verify::run(&prefix, user_version)?;
        }
        Commands::Dump {
            prefix,
            limit,
            format,
        } => {
            tracing::debug!(?prefix, ?limit, "dumping database");
            commands::dump::run(&prefix, limit, &format)?;
        }
        Commands::Version => {
            println!("ShakeDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ShakeDB Core v{}", shakedb_core::VERSION);
        }
    }

    Ok(())
}
