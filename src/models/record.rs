//! Record types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value state of one collection.
///
/// Ordered so that `key_value.json` is written deterministically.
pub type KeyValueMap = BTreeMap<String, String>;

/// One timestamped payload within a document.
///
/// `data` is opaque: structured payloads are carried as their compact JSON
/// text and never parsed into fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Opaque payload.
    pub data: String,
}

impl Record {
    /// Creates a new record.
    #[must_use]
    pub fn new(ts: i64, data: impl Into<String>) -> Self {
        Self {
            ts,
            data: data.into(),
        }
    }
}

/// One line of a current-format `.jsonl` archive.
///
/// `doc` is always written on export. It may be absent on import, which is
/// taken as agreement with the document named by the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLine {
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Owning document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Opaque payload.
    pub data: String,
}

impl ArchiveLine {
    /// Builds the line written for `record` in `document`.
    #[must_use]
    pub fn for_record(document: &str, record: &Record) -> Self {
        Self {
            ts: record.ts,
            doc: Some(document.to_string()),
            data: record.data.clone(),
        }
    }

    /// Converts the line into a record, dropping the document name.
    #[must_use]
    pub fn into_record(self) -> Record {
        Record {
            ts: self.ts,
            data: self.data,
        }
    }
}

/// One element of a multi-record insert call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertRecord {
    /// Target collection.
    #[serde(rename = "col")]
    pub collection: String,
    /// Target document.
    #[serde(rename = "doc")]
    pub document: String,
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Opaque payload.
    pub data: String,
}

impl InsertRecord {
    /// Addresses `record` to `collection`/`document`.
    #[must_use]
    pub fn new(collection: &str, document: &str, record: Record) -> Self {
        Self {
            collection: collection.to_string(),
            document: document.to_string(),
            ts: record.ts,
            data: record.data,
        }
    }
}
