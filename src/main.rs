//! Binary entry point for fluxion-archive.
//!
//! This binary provides the CLI for exporting and importing FluxionDB
//! collections.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use fluxion_archive::config::ArchiveConfig;
use fluxion_archive::observability;

/// Export and import FluxionDB collections.
#[derive(Parser)]
#[command(name = "fluxion-archive")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// `SQLite` store path (overrides config and `FLUXION_ARCHIVE_DB`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export collections, key/value pairs, and/or API keys.
    Export {
        /// Directory where the export files will be written.
        #[arg(long)]
        out_dir: PathBuf,

        /// Collection to export.
        #[arg(long)]
        col: Option<String>,

        /// Export API keys to apikeys.json.
        #[arg(long)]
        api_keys: bool,

        /// Export all collections and API keys.
        #[arg(long)]
        all: bool,
    },

    /// Import collections, key/value pairs, and/or API keys.
    Import {
        /// Directory containing the export files.
        #[arg(long)]
        in_dir: PathBuf,

        /// Collection to import.
        #[arg(long)]
        col: Option<String>,

        /// Import API keys from apikeys.json.
        #[arg(long)]
        api_keys: bool,

        /// Import all collections found in the directory and API keys.
        #[arg(long)]
        all: bool,

        /// Import legacy layout: <in-dir>/<collection>/<document>/*.json
        #[arg(long)]
        legacy: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Resolves configuration, applying `--db` last.
fn load_config(cli: &Cli) -> fluxion_archive::Result<ArchiveConfig> {
    let config = ArchiveConfig::load(cli.config.as_deref())?;
    Ok(match &cli.db {
        Some(db) => config.with_store_path(db),
        None => config,
    })
}

/// Runs the selected command.
fn run_command(command: Commands, config: &ArchiveConfig) -> fluxion_archive::Result<()> {
    match command {
        Commands::Export {
            out_dir,
            col,
            api_keys,
            all,
        } => commands::cmd_export(config, out_dir, col, api_keys, all),
        Commands::Import {
            in_dir,
            col,
            api_keys,
            all,
            legacy,
        } => commands::cmd_import(config, in_dir, col, api_keys, all, legacy),
    }
}
