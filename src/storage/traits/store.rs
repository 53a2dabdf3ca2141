//! Store trait consumed by the archive pipelines.

use crate::Result;
use crate::models::{ApiKeyEntry, ApiKeyScope, InsertRecord, KeyValueMap, Record};
use std::collections::BTreeMap;

/// A FluxionDB-compatible data store.
///
/// The pipelines only ever call these operations, sequentially and from one
/// thread. Implementations own any deadline or retry policy; errors are
/// propagated to the caller verbatim.
///
/// Filters are regular expressions matched against document names or keys.
/// An invalid pattern matches everything.
pub trait Store: Send + Sync {
    /// Lists every collection that holds records or key/value pairs.
    fn fetch_collections(&self) -> Result<Vec<String>>;

    /// Returns the latest record at or before `as_of` for each document.
    fn fetch_latest_records(
        &self,
        collection: &str,
        as_of: i64,
        doc_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Record>>;

    /// Returns every record of `document` with `from <= ts <= to`, in store order.
    fn fetch_document(
        &self,
        collection: &str,
        document: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Record>>;

    /// Returns the key/value map of `collection`.
    fn get_values(&self, collection: &str, key_filter: Option<&str>) -> Result<KeyValueMap>;

    /// Sets one key/value pair.
    fn set_value(&self, collection: &str, key: &str, value: &str) -> Result<()>;

    /// Inserts a batch of records in order.
    fn insert_multiple_records(&self, batch: &[InsertRecord]) -> Result<()>;

    /// Lists all API keys.
    fn list_api_keys(&self) -> Result<Vec<ApiKeyEntry>>;

    /// Adds (or replaces) an API key.
    fn add_api_key(&self, key: &str, scope: ApiKeyScope) -> Result<()>;
}
