//! Import and export command handlers.

use std::path::PathBuf;

use fluxion_archive::config::ArchiveConfig;
use fluxion_archive::io::formats::Format;
use fluxion_archive::io::services::export::{ExportOptions, ExportService};
use fluxion_archive::io::services::import::{ImportOptions, ImportService};
use fluxion_archive::storage::SqliteStore;
use fluxion_archive::{Error, Result};
use serde::Serialize;

/// Executes the export command.
pub fn cmd_export(
    config: &ArchiveConfig,
    out_dir: PathBuf,
    collection: Option<String>,
    api_keys: bool,
    all: bool,
) -> Result<()> {
    let mut options = ExportOptions::new(out_dir)
        .with_api_keys(api_keys)
        .with_all(all);
    if let Some(c) = collection {
        options = options.with_collection(c);
    }

    let store = SqliteStore::new(&config.store_path)?;
    let report = ExportService::new(&store).run(&options)?;
    print_json(&report)
}

/// Executes the import command.
pub fn cmd_import(
    config: &ArchiveConfig,
    in_dir: PathBuf,
    collection: Option<String>,
    api_keys: bool,
    all: bool,
    legacy: bool,
) -> Result<()> {
    let format = if legacy { Format::Legacy } else { Format::Current };
    let mut options = ImportOptions::new(in_dir)
        .with_api_keys(api_keys)
        .with_all(all)
        .with_format(format);
    if let Some(c) = collection {
        options = options.with_collection(c);
    }

    let store = SqliteStore::new(&config.store_path)?;
    let report = ImportService::new(&store).run(&options)?;
    print_json(&report)
}

/// Prints a summary as 2-space indented JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "encode_summary".to_string(),
        cause: e.to_string(),
    })?;
    println!("{json}");
    Ok(())
}
