//! Collection import service.
//!
//! Reads collections from `<in_dir>/<collection>/` in either layout and
//! streams their records into a [`Store`] through a [`BatchSink`].

use crate::io::batch::BatchSink;
use crate::io::discovery::discover_collections;
use crate::io::formats::{DocumentArchive, Format, list_documents};
use crate::io::naming::{API_KEYS_FILE, collection_dir};
use crate::io::snapshot::{read_api_keys, read_key_values};
use crate::storage::Store;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Options for an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Archive root directory.
    pub in_dir: PathBuf,
    /// Single collection to import.
    pub collection: Option<String>,
    /// Import API keys from `apikeys.json`.
    pub api_keys: bool,
    /// Import every discovered collection and the API keys.
    pub all: bool,
    /// On-disk layout of the archive.
    pub format: Format,
}

impl ImportOptions {
    /// Creates options reading from `in_dir` with nothing selected.
    #[must_use]
    pub fn new(in_dir: impl Into<PathBuf>) -> Self {
        Self {
            in_dir: in_dir.into(),
            ..Self::default()
        }
    }

    /// Creates options importing everything from `in_dir`.
    #[must_use]
    pub fn all(in_dir: impl Into<PathBuf>) -> Self {
        Self::new(in_dir).with_all(true)
    }

    /// Selects a single collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Enables or disables API key import.
    #[must_use]
    pub const fn with_api_keys(mut self, api_keys: bool) -> Self {
        self.api_keys = api_keys;
        self
    }

    /// Enables or disables importing everything.
    #[must_use]
    pub const fn with_all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    /// Sets the archive layout.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    fn selected_collection(&self) -> Option<&str> {
        self.collection.as_deref().filter(|c| !c.is_empty())
    }

    const fn include_api_keys(&self) -> bool {
        self.api_keys || self.all
    }
}

/// Per-collection import summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Collection name.
    pub collection: String,
    /// Documents read.
    pub documents: usize,
    /// Records inserted.
    pub records: usize,
    /// Key/value pairs set.
    pub key_values: usize,
    /// Directory the collection was read from.
    pub input_dir: String,
}

/// API key import summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeysImported {
    /// Keys added.
    pub keys: usize,
    /// Path of `apikeys.json`.
    pub input_file: String,
}

/// Result of an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Archive root directory.
    pub input_dir: String,
    /// One entry per imported collection, in import order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<ImportSummary>,
    /// Present when API keys were imported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<ApiKeysImported>,
}

impl ImportReport {
    /// Total records inserted across all collections.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|c| c.records).sum()
    }
}

/// Service importing collections into a [`Store`].
pub struct ImportService<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ImportService<'a, S> {
    /// Creates a new import service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Runs an import.
    ///
    /// The run stops at the first error. Batches inserted before the error
    /// stay in the store, so re-running the same import inserts them again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if nothing is selected,
    /// [`Error::NotFound`] if a requested collection or `apikeys.json` is
    /// missing, an archive error for unreadable or inconsistent files, or
    /// the store error if a store call fails.
    #[instrument(skip(self, options), fields(in_dir = %options.in_dir.display(), format = %options.format))]
    pub fn run(&self, options: &ImportOptions) -> Result<ImportReport> {
        if !options.all && options.selected_collection().is_none() && !options.api_keys {
            return Err(Error::InvalidInput(
                "specify at least one of --col, --api-keys, or --all".to_string(),
            ));
        }

        let collections = if options.all {
            discover_collections(&options.in_dir, options.format)?
        } else {
            options
                .selected_collection()
                .map(|c| vec![c.to_string()])
                .unwrap_or_default()
        };

        if collections.is_empty() && !options.include_api_keys() {
            return Err(Error::InvalidInput("nothing to import".to_string()));
        }

        let mut report = ImportReport {
            input_dir: options.in_dir.display().to_string(),
            collections: Vec::with_capacity(collections.len()),
            api_keys: None,
        };

        for collection in &collections {
            let summary = self.import_collection(collection, &options.in_dir, options.format)?;
            tracing::info!(
                collection = %summary.collection,
                documents = summary.documents,
                records = summary.records,
                key_values = summary.key_values,
                "imported collection"
            );
            report.collections.push(summary);
        }

        if options.include_api_keys() {
            let summary = self.import_api_keys(&options.in_dir)?;
            tracing::info!(keys = summary.keys, "imported api keys");
            report.api_keys = Some(summary);
        }

        Ok(report)
    }

    /// Imports one collection from `<in_dir>/<collection>/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the collection directory is missing,
    /// or the first file or store error.
    #[instrument(skip(self, in_dir))]
    pub fn import_collection(
        &self,
        collection: &str,
        in_dir: &Path,
        format: Format,
    ) -> Result<ImportSummary> {
        let collection_dir = collection_dir(in_dir, collection)?;
        let documents = list_documents(&collection_dir, format)?;

        let mut records = 0;
        for archive in &documents {
            records += self.import_document(collection, archive)?;
        }

        let values = read_key_values(&collection_dir)?;
        for (key, value) in &values {
            self.store.set_value(collection, key, value)?;
        }

        Ok(ImportSummary {
            collection: collection.to_string(),
            documents: documents.len(),
            records,
            key_values: values.len(),
            input_dir: collection_dir.display().to_string(),
        })
    }

    fn import_document(&self, collection: &str, archive: &DocumentArchive) -> Result<usize> {
        let mut source = archive.open()?;
        let mut sink = BatchSink::new(self.store, collection, &archive.document);
        while let Some(record) = source.next()? {
            sink.push(record)?;
        }
        let inserted = sink.finish()?;

        tracing::debug!(
            collection,
            document = %archive.document,
            files = archive.files.len(),
            records = inserted,
            "imported document"
        );
        Ok(inserted)
    }

    fn import_api_keys(&self, in_dir: &Path) -> Result<ApiKeysImported> {
        let keys = read_api_keys(in_dir)?;
        for entry in &keys {
            self.store.add_api_key(&entry.key, entry.scope)?;
        }
        Ok(ApiKeysImported {
            keys: keys.len(),
            input_file: in_dir.join(API_KEYS_FILE).display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchiveErrorKind;
    use crate::models::{ApiKeyEntry, ApiKeyScope, Record};
    use crate::storage::MemoryStore;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_requires_a_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let err = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_import_current_collection() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "sensors/device%2F1.jsonl",
            "{\"ts\":2,\"doc\":\"device/1\",\"data\":\"b\"}\n{\"ts\":1,\"data\":\"a\"}\n",
        );
        write(dir.path(), "sensors/notes.txt", "ignored");
        write(dir.path(), "sensors/key_value.json", "{\"unit\":\"celsius\"}");

        let store = MemoryStore::new();
        let report = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()).with_collection("sensors"))
            .unwrap();

        let summary = &report.collections[0];
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.key_values, 1);
        assert_eq!(
            store.records("sensors", "device/1"),
            vec![Record::new(1, "a"), Record::new(2, "b")]
        );
        assert_eq!(store.get_values("sensors", None).unwrap()["unit"], "celsius");
        assert_eq!(store.insert_calls(), vec![2]);
    }

    #[test]
    fn test_import_legacy_collection() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "cell_info/doc-1/1771760179.json", "{\"status\":\"ok\"}");
        write(
            dir.path(),
            "cell_info/doc-2/batch.json",
            "[{\"data\":\"a\",\"ts\":1},{\"data\":\"b\",\"ts\":2}]",
        );

        write(dir.path(), "apikeys.json", "[]");

        let store = MemoryStore::new();
        let report = ImportService::new(&store)
            .run(&ImportOptions::all(dir.path()).with_format(Format::Legacy))
            .unwrap();
        assert_eq!(report.collections.len(), 1);
        assert_eq!(report.collections[0].collection, "cell_info");
        assert_eq!(report.collections[0].documents, 2);
        assert_eq!(report.total_records(), 3);
        assert_eq!(report.api_keys.as_ref().map(|k| k.keys), Some(0));
        assert_eq!(
            store.records("cell_info", "doc-1"),
            vec![Record::new(1_771_760_179, "{\"status\":\"ok\"}")]
        );
    }

    #[test]
    fn test_all_requires_api_keys_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "c/doc.jsonl", "{\"ts\":1,\"data\":\"x\"}\n");

        let store = MemoryStore::new();
        let err = ImportService::new(&store)
            .run(&ImportOptions::all(dir.path()))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { what: "api keys file", .. }));
        // Collections imported before the failure stay applied.
        assert_eq!(store.records("c", "doc").len(), 1);
    }

    #[test]
    fn test_missing_collection_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let err = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()).with_collection("ghost"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { what: "collection path", .. }));
    }

    #[test]
    fn test_absolute_collection_name_reads_under_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "abs/sensors/d.jsonl", "{\"ts\":1,\"data\":\"x\"}\n");

        let store = MemoryStore::new();
        let report = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()).with_collection("/abs/sensors"))
            .unwrap();

        assert_eq!(report.collections[0].records, 1);
        assert_eq!(store.records("/abs/sensors", "d"), vec![Record::new(1, "x")]);
    }

    #[test]
    fn test_parent_segment_in_collection_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "outside/d.jsonl", "{\"ts\":1,\"data\":\"x\"}\n");
        let in_dir = root.path().join("archive");
        fs::create_dir_all(&in_dir).unwrap();

        let store = MemoryStore::new();
        let err = ImportService::new(&store)
            .run(&ImportOptions::new(&in_dir).with_collection("../outside"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.insert_calls().is_empty());
    }

    #[test]
    fn test_document_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "c/a.jsonl", "{\"ts\":1,\"doc\":\"b\",\"data\":\"x\"}\n");

        let store = MemoryStore::new();
        let err = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()).with_collection("c"))
            .unwrap_err();
        assert!(matches!(
            err.archive_kind(),
            Some(ArchiveErrorKind::DocumentMismatch { .. })
        ));
        assert!(store.insert_calls().is_empty());
    }

    #[test]
    fn test_import_api_keys() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "apikeys.json",
            "[{\"key\":\"k1\",\"scope\":\"read_write\"},{\"key\":\"\",\"scope\":\"readonly\"}]",
        );

        let store = MemoryStore::new();
        let report = ImportService::new(&store)
            .run(&ImportOptions::new(dir.path()).with_api_keys(true))
            .unwrap();
        assert!(report.collections.is_empty());
        assert_eq!(report.api_keys.as_ref().map(|k| k.keys), Some(1));
        assert_eq!(
            store.list_api_keys().unwrap(),
            vec![ApiKeyEntry::new("k1", ApiKeyScope::ReadWrite)]
        );
    }
}
