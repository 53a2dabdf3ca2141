//! In-memory store for testing.
//!
//! Provides a non-persistent implementation of [`Store`] that keeps every
//! inserted record (no deduplication) and logs each multi-record insert so
//! batch boundaries can be asserted.

use crate::models::{ApiKeyEntry, ApiKeyScope, InsertRecord, KeyValueMap, Record};
use crate::storage::filter::NameFilter;
use crate::storage::sqlite::acquire_lock;
use crate::storage::traits::Store;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    /// collection -> document -> records ordered by ts, arrival order among ties.
    records: BTreeMap<String, BTreeMap<String, Vec<Record>>>,
    values: BTreeMap<String, KeyValueMap>,
    api_keys: BTreeMap<String, ApiKeyScope>,
    insert_calls: Vec<usize>,
    fail_after: Option<usize>,
}

/// In-memory [`Store`].
///
/// # Example
///
/// ```rust,ignore
/// use fluxion_archive::storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.fail_insert_after(2);
/// // the third insert_multiple_records call now fails
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of every successful `insert_multiple_records` call, in call order.
    #[must_use]
    pub fn insert_calls(&self) -> Vec<usize> {
        acquire_lock(&self.state).insert_calls.clone()
    }

    /// Makes every insert call after the first `successful` ones fail.
    pub fn fail_insert_after(&self, successful: usize) {
        acquire_lock(&self.state).fail_after = Some(successful);
    }

    /// All records of one document, in stored order.
    #[must_use]
    pub fn records(&self, collection: &str, document: &str) -> Vec<Record> {
        acquire_lock(&self.state)
            .records
            .get(collection)
            .and_then(|docs| docs.get(document))
            .cloned()
            .unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn fetch_collections(&self) -> Result<Vec<String>> {
        let state = acquire_lock(&self.state);
        let mut collections: Vec<String> = state
            .records
            .keys()
            .chain(state.values.keys())
            .cloned()
            .collect();
        collections.sort();
        collections.dedup();
        Ok(collections)
    }

    fn fetch_latest_records(
        &self,
        collection: &str,
        as_of: i64,
        doc_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Record>> {
        let filter = NameFilter::compile(doc_filter);
        let state = acquire_lock(&self.state);
        let Some(docs) = state.records.get(collection) else {
            return Ok(BTreeMap::new());
        };

        Ok(docs
            .iter()
            .filter(|(doc, _)| filter.matches(doc))
            .filter_map(|(doc, records)| {
                records
                    .iter()
                    .rev()
                    .find(|r| r.ts <= as_of)
                    .map(|r| (doc.clone(), r.clone()))
            })
            .collect())
    }

    fn fetch_document(
        &self,
        collection: &str,
        document: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Record>> {
        let state = acquire_lock(&self.state);
        Ok(state
            .records
            .get(collection)
            .and_then(|docs| docs.get(document))
            .map(|records| {
                records
                    .iter()
                    .filter(|r| (from..=to).contains(&r.ts))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_values(&self, collection: &str, key_filter: Option<&str>) -> Result<KeyValueMap> {
        let filter = NameFilter::compile(key_filter);
        let state = acquire_lock(&self.state);
        Ok(state
            .values
            .get(collection)
            .map(|values| {
                values
                    .iter()
                    .filter(|(key, _)| filter.matches(key))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set_value(&self, collection: &str, key: &str, value: &str) -> Result<()> {
        acquire_lock(&self.state)
            .values
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn insert_multiple_records(&self, batch: &[InsertRecord]) -> Result<()> {
        let mut state = acquire_lock(&self.state);
        if state
            .fail_after
            .is_some_and(|limit| state.insert_calls.len() >= limit)
        {
            return Err(Error::OperationFailed {
                operation: "insert_multiple_records".to_string(),
                cause: "injected failure".to_string(),
            });
        }

        for item in batch {
            let records = state
                .records
                .entry(item.collection.clone())
                .or_default()
                .entry(item.document.clone())
                .or_default();
            let at = records.partition_point(|r| r.ts <= item.ts);
            records.insert(at, Record::new(item.ts, item.data.clone()));
        }
        state.insert_calls.push(batch.len());
        Ok(())
    }

    fn list_api_keys(&self) -> Result<Vec<ApiKeyEntry>> {
        Ok(acquire_lock(&self.state)
            .api_keys
            .iter()
            .map(|(key, scope)| ApiKeyEntry::new(key.clone(), *scope))
            .collect())
    }

    fn add_api_key(&self, key: &str, scope: ApiKeyScope) -> Result<()> {
        acquire_lock(&self.state)
            .api_keys
            .insert(key.to_string(), scope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(doc: &str, ts: i64, data: &str) -> InsertRecord {
        InsertRecord::new("c", doc, Record::new(ts, data))
    }

    #[test]
    fn test_records_ordered_by_ts_keeping_arrival_order() {
        let store = MemoryStore::new();
        store
            .insert_multiple_records(&[
                insert("d", 2, "second"),
                insert("d", 1, "first"),
                insert("d", 2, "second-again"),
            ])
            .unwrap();

        let data: Vec<_> = store
            .records("c", "d")
            .into_iter()
            .map(|r| r.data)
            .collect();
        assert_eq!(data, ["first", "second", "second-again"]);
    }

    #[test]
    fn test_latest_records_respects_as_of_and_filter() {
        let store = MemoryStore::new();
        store
            .insert_multiple_records(&[
                insert("a", 1, "a1"),
                insert("a", 5, "a5"),
                insert("b", 9, "b9"),
            ])
            .unwrap();

        let latest = store.fetch_latest_records("c", 4, None).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["a"].data, "a1");

        let filtered = store.fetch_latest_records("c", i64::MAX, Some("^b")).unwrap();
        assert_eq!(filtered.keys().collect::<Vec<_>>(), ["b"]);
        assert!(store.fetch_latest_records("missing", 0, None).unwrap().is_empty());
    }

    #[test]
    fn test_insert_log_and_injected_failure() {
        let store = MemoryStore::new();
        store.fail_insert_after(1);

        store.insert_multiple_records(&[insert("d", 1, "x")]).unwrap();
        let err = store
            .insert_multiple_records(&[insert("d", 2, "y")])
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
        assert_eq!(store.insert_calls(), vec![1]);
        assert_eq!(store.records("c", "d").len(), 1);
    }

    #[test]
    fn test_values_keys_and_collections() {
        let store = MemoryStore::new();
        store.set_value("kv-only", "k", "v").unwrap();
        store.insert_multiple_records(&[insert("d", 1, "x")]).unwrap();
        store.add_api_key("k2", ApiKeyScope::ReadWrite).unwrap();
        store.add_api_key("k1", ApiKeyScope::ReadOnly).unwrap();

        assert_eq!(store.fetch_collections().unwrap(), ["c", "kv-only"]);
        assert_eq!(store.get_values("kv-only", None).unwrap()["k"], "v");
        assert!(store.get_values("kv-only", Some("^z")).unwrap().is_empty());
        assert_eq!(
            store.list_api_keys().unwrap(),
            vec![
                ApiKeyEntry::new("k1", ApiKeyScope::ReadOnly),
                ApiKeyEntry::new("k2", ApiKeyScope::ReadWrite),
            ]
        );
    }
}
