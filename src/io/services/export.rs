//! Collection export service.
//!
//! Writes each selected collection to `<out_dir>/<collection>/` in the
//! current layout and, when requested, the API keys to `<out_dir>/apikeys.json`.

use crate::io::formats::JsonlWriter;
use crate::io::naming::{collection_dir, document_file_name};
use crate::io::snapshot::{write_api_keys, write_key_values};
use crate::io::traits::RecordSink;
use crate::storage::Store;
use crate::{ArchiveError, Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Options for an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory the archive is written to.
    pub out_dir: PathBuf,
    /// Single collection to export.
    pub collection: Option<String>,
    /// Export API keys.
    pub api_keys: bool,
    /// Export every collection and the API keys.
    pub all: bool,
}

impl ExportOptions {
    /// Creates options writing to `out_dir` with nothing selected.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// Creates options exporting everything to `out_dir`.
    #[must_use]
    pub fn all(out_dir: impl Into<PathBuf>) -> Self {
        Self::new(out_dir).with_all(true)
    }

    /// Selects a single collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Enables or disables API key export.
    #[must_use]
    pub const fn with_api_keys(mut self, api_keys: bool) -> Self {
        self.api_keys = api_keys;
        self
    }

    /// Enables or disables exporting everything.
    #[must_use]
    pub const fn with_all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    fn selected_collection(&self) -> Option<&str> {
        self.collection.as_deref().filter(|c| !c.is_empty())
    }

    const fn include_api_keys(&self) -> bool {
        self.api_keys || self.all
    }
}

/// Per-collection export summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    /// Collection name.
    pub collection: String,
    /// Documents written.
    pub documents: usize,
    /// Records written across all documents.
    pub records: usize,
    /// Directory holding the collection's files.
    pub output_dir: String,
}

/// API key export summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeysSummary {
    /// Keys written.
    pub keys: usize,
    /// Path of `apikeys.json`.
    pub output_file: String,
}

/// Result of an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    /// Root directory of the archive.
    pub output_dir: String,
    /// One entry per exported collection, in export order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<ExportSummary>,
    /// Present when API keys were exported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<ApiKeysSummary>,
}

impl ExportReport {
    /// Total records written across all collections.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|c| c.records).sum()
    }
}

/// Service exporting collections from a [`Store`].
pub struct ExportService<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ExportService<'a, S> {
    /// Creates a new export service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Runs an export.
    ///
    /// The run stops at the first error; files already written stay on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if nothing is selected, the store
    /// error if a store call fails, or an archive error if a file cannot be
    /// written.
    #[instrument(skip(self, options), fields(out_dir = %options.out_dir.display()))]
    pub fn run(&self, options: &ExportOptions) -> Result<ExportReport> {
        if !options.all && options.selected_collection().is_none() && !options.api_keys {
            return Err(Error::InvalidInput(
                "specify at least one of --col, --api-keys, or --all".to_string(),
            ));
        }

        let collections = if options.all {
            let mut collections = self.store.fetch_collections()?;
            collections.retain(|c| !c.is_empty());
            collections.sort();
            collections
        } else {
            options
                .selected_collection()
                .map(|c| vec![c.to_string()])
                .unwrap_or_default()
        };

        if collections.is_empty() && !options.include_api_keys() {
            return Err(Error::InvalidInput("nothing to export".to_string()));
        }

        let mut report = ExportReport {
            output_dir: options.out_dir.display().to_string(),
            collections: Vec::with_capacity(collections.len()),
            api_keys: None,
        };

        for collection in &collections {
            let summary = self.export_collection(collection, &options.out_dir)?;
            tracing::info!(
                collection = %summary.collection,
                documents = summary.documents,
                records = summary.records,
                "exported collection"
            );
            report.collections.push(summary);
        }

        if options.include_api_keys() {
            let summary = self.export_api_keys(&options.out_dir)?;
            tracing::info!(keys = summary.keys, "exported api keys");
            report.api_keys = Some(summary);
        }

        Ok(report)
    }

    /// Exports one collection into `<out_dir>/<collection>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if a store call or a file write fails.
    #[instrument(skip(self, out_dir))]
    pub fn export_collection(&self, collection: &str, out_dir: &Path) -> Result<ExportSummary> {
        let collection_dir = collection_dir(out_dir, collection)?;
        create_dir(&collection_dir)?;

        let latest = self.store.fetch_latest_records(collection, i64::MAX, None)?;
        // BTreeMap keys are already sorted.
        let documents: Vec<&String> = latest.keys().filter(|doc| !doc.is_empty()).collect();

        let mut records = 0;
        for document in &documents {
            records += self.export_document(collection, document, &collection_dir)?;
        }

        let values = self.store.get_values(collection, None)?;
        write_key_values(&collection_dir, &values)?;

        Ok(ExportSummary {
            collection: collection.to_string(),
            documents: documents.len(),
            records,
            output_dir: collection_dir.display().to_string(),
        })
    }

    fn export_document(&self, collection: &str, document: &str, collection_dir: &Path) -> Result<usize> {
        let records = self
            .store
            .fetch_document(collection, document, i64::MIN, i64::MAX)?;

        let path = collection_dir.join(document_file_name(document));
        let mut sink: Box<dyn RecordSink> = Box::new(JsonlWriter::create(&path, document)?);
        for record in &records {
            sink.write(record)?;
        }
        let written = sink.finalize()?;

        metrics::counter!("archive_documents_exported_total").increment(1);
        metrics::counter!("archive_records_exported_total").increment(written as u64);
        tracing::debug!(collection, document, records = written, "exported document");
        Ok(written)
    }

    fn export_api_keys(&self, out_dir: &Path) -> Result<ApiKeysSummary> {
        create_dir(out_dir)?;
        let keys = self.store.list_api_keys()?;
        let path = write_api_keys(out_dir, &keys)?;
        Ok(ApiKeysSummary {
            keys: keys.len(),
            output_file: path.display().to_string(),
        })
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ArchiveError::io("create", dir, e).into())
}
