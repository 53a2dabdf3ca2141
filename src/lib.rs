//! # Fluxion Archive
//!
//! Moves FluxionDB collections between a store and a local directory tree.
//!
//! A collection is a set of time-series documents plus a key/value map. The
//! archive pipeline exports each document to a line-delimited JSON file and
//! the key/value map to `key_value.json`, and imports either that layout or
//! the legacy per-timestamp layout back into a store.
//!
//! ## Layouts
//!
//! | Layout | Document files | Key/value file |
//! |--------|----------------|----------------|
//! | Current | `<dir>/<collection>/<encoded doc>.jsonl` | `<dir>/<collection>/key_value.json` |
//! | Legacy | `<dir>/<collection>/<doc>/**/*.json` | `<dir>/<collection>/key_value.json` |
//!
//! API keys live in `<dir>/apikeys.json` for either layout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fluxion_archive::io::{ExportOptions, ExportService};
//! use fluxion_archive::storage::SqliteStore;
//!
//! let store = SqliteStore::new("fluxion.db")?;
//! let report = ExportService::new(&store).run(&ExportOptions::all("backup"))?;
//! println!("exported {} collections", report.collections.len());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use std::fmt;
use std::path::PathBuf;

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::{ArchiveConfig, LogFormat, LoggingConfig};
pub use models::{ApiKeyEntry, ApiKeyScope, ArchiveLine, InsertRecord, KeyValueMap, Record};
pub use storage::{MemoryStore, SqliteStore, Store};

/// Error type for archive operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | No collection or API-key selection, malformed options |
/// | `OperationFailed` | Store calls fail, directories cannot be read or created |
/// | `NotFound` | A requested collection directory or `apikeys.json` is missing |
/// | `Archive` | A specific archive file cannot be read, parsed or written |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Store backends report their failures through this variant and the
    /// pipelines propagate them without translation.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A required resource is missing.
    #[error("{what} {} not found", .path.display())]
    NotFound {
        /// What was expected at the path (e.g. "collection path").
        what: &'static str,
        /// The path that does not exist.
        path: PathBuf,
    },

    /// A file-bound archive failure.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure tied to one archive file, and optionally one element within it.
///
/// Callers match on [`ArchiveError::kind`] to distinguish I/O failures from
/// decode and consistency errors.
#[derive(Debug)]
pub struct ArchiveError {
    /// What was being done when the failure occurred (e.g. `"decode"`).
    pub operation: &'static str,
    /// The file the failure belongs to.
    pub path: PathBuf,
    /// Zero-based array element (legacy files) or line (`.jsonl` archives).
    pub index: Option<usize>,
    /// The underlying cause.
    pub kind: ArchiveErrorKind,
}

impl ArchiveError {
    /// Creates an error for a whole file.
    pub fn new(operation: &'static str, path: impl Into<PathBuf>, kind: ArchiveErrorKind) -> Self {
        Self {
            operation,
            path: path.into(),
            index: None,
            kind,
        }
    }

    /// Attaches an array element index.
    #[must_use]
    pub const fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Shorthand for an I/O failure on `path`.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(operation, path, ArchiveErrorKind::Io(source))
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.path.display())?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Cause of an [`ArchiveError`].
#[derive(Debug, ThisError)]
pub enum ArchiveErrorKind {
    /// Opening, reading or writing the file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file (or one line of it) is not valid JSON of the expected shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A legacy file whose top-level value is neither an object nor an array.
    #[error("expected JSON object or array")]
    UnexpectedShape,

    /// A timestamp field is present but not an integer, float or numeric string.
    #[error("invalid {field}: {reason}")]
    InvalidTimestamp {
        /// The field that held the bad value.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No timestamp field and the file name is not a unix timestamp.
    #[error("invalid timestamp: neither ts/timestamp/time field nor numeric filename")]
    MissingTimestamp,

    /// A `.jsonl` line names a different document than its file.
    #[error("document mismatch: got {found}, expected {expected}")]
    DocumentMismatch {
        /// Document implied by the file name.
        expected: String,
        /// Document embedded in the line.
        found: String,
    },

    /// An API-key entry with a scope outside the three known scopes.
    #[error("key {key}: invalid scope {scope:?}")]
    InvalidScope {
        /// The offending key.
        key: String,
        /// The scope string as written.
        scope: String,
    },
}

impl Error {
    /// Returns the archive error kind, if this is a file-bound failure.
    #[must_use]
    pub const fn archive_kind(&self) -> Option<&ArchiveErrorKind> {
        match self {
            Self::Archive(err) => Some(&err.kind),
            _ => None,
        }
    }
}
