//! Archive layouts.
//!
//! Each layout reduces a collection directory to a sorted list of
//! [`DocumentArchive`]s, and each of those to a [`RecordSource`].

pub mod jsonl;
pub mod legacy;

use crate::io::naming::decode_document_name;
use crate::io::traits::RecordSource;
use crate::{ArchiveError, Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use jsonl::{JsonlSource, JsonlWriter};
pub use legacy::{LegacyDocumentSource, collect_legacy_files, parse_legacy_records};

/// Supported on-disk layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// `<collection>/<encoded doc>.jsonl`, one record per line.
    #[default]
    Current,
    /// `<collection>/<doc>/**/*.json`, one record or an array per file.
    Legacy,
}

impl Format {
    /// Returns the layout name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The files holding one document of a collection directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentArchive {
    /// Decoded document name.
    pub document: String,
    /// The `.jsonl` file (current) or every `.json` file, sorted (legacy).
    pub files: Vec<PathBuf>,
    format: Format,
}

impl DocumentArchive {
    /// Opens a record stream over the document's files.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be opened.
    pub fn open(&self) -> Result<Box<dyn RecordSource>> {
        match self.format {
            Format::Current => {
                let path = self.files.first().ok_or_else(|| Error::OperationFailed {
                    operation: "open_document".to_string(),
                    cause: format!("no archive file for document {}", self.document),
                })?;
                Ok(Box::new(JsonlSource::open(path, self.document.clone())?))
            },
            Format::Legacy => Ok(Box::new(LegacyDocumentSource::new(self.files.clone()))),
        }
    }
}

/// Lists the documents stored in `collection_dir`, sorted by name.
///
/// Current layout: files whose names do not decode as document archives are
/// skipped. Legacy layout: subdirectories without any `.json` file are
/// skipped.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the directory does not exist, or an
/// archive error if it cannot be read.
pub fn list_documents(collection_dir: &Path, format: Format) -> Result<Vec<DocumentArchive>> {
    let entries = fs::read_dir(collection_dir).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::NotFound {
                what: "collection path",
                path: collection_dir.to_path_buf(),
            }
        } else {
            ArchiveError::io("read", collection_dir, e).into()
        }
    })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io("read", collection_dir, e))?;
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map_err(|e| ArchiveError::io("stat", &path, e))?
            .is_dir();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };

        match format {
            Format::Current if !is_dir => {
                let Some(document) = decode_document_name(&name) else {
                    tracing::debug!(file = %name, "not a document archive, skipping");
                    continue;
                };
                documents.push(DocumentArchive {
                    document,
                    files: vec![path],
                    format,
                });
            },
            Format::Legacy if is_dir => {
                let files = collect_legacy_files(&path)?;
                if files.is_empty() {
                    tracing::debug!(document = %name, "no legacy files, skipping");
                    continue;
                }
                documents.push(DocumentArchive {
                    document: name,
                    files,
                    format,
                });
            },
            _ => {},
        }
    }

    documents.sort_by(|a, b| a.document.cmp(&b.document));
    Ok(documents)
}
