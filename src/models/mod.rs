//! Data models for the archive pipeline.
//!
//! Collections, documents and records are rebuilt per invocation from either
//! a store or the filesystem; nothing here outlives a single run.

mod api_key;
mod record;

pub use api_key::{ApiKeyEntry, ApiKeyScope};
pub use record::{ArchiveLine, InsertRecord, KeyValueMap, Record};
