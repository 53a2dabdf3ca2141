//! `SQLite`-backed store.
//!
//! Opens a FluxionDB server data file (or a fresh database with the same
//! schema) and serves the [`Store`] operations from it.
//!
//! # Concurrency Model
//!
//! Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
//! The archive pipelines are sequential, so the lock is never contended in
//! practice.
//!
//! # Duplicates
//!
//! Records are keyed by `(collection, doc, ts)` and inserted with
//! `INSERT OR REPLACE`, so re-importing the same archive overwrites rather
//! than duplicates.

mod connection;
mod sql;

pub use connection::{acquire_lock, configure_connection};

use crate::models::{ApiKeyEntry, ApiKeyScope, InsertRecord, KeyValueMap, Record};
use crate::storage::filter::NameFilter;
use crate::storage::traits::Store;
use crate::{Error, Result};
use rusqlite::{Connection, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

/// `SQLite`-backed [`Store`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(sqlite_error("open_sqlite"))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_error("open_sqlite_in_memory"))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        conn.execute_batch(sql::SCHEMA)
            .map_err(sqlite_error("create_schema"))?;
        Ok(())
    }
}

/// Maps a rusqlite error into [`Error::OperationFailed`].
fn sqlite_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

fn record_operation_metrics(operation: &'static str, start: Instant, ok: bool) {
    let status = if ok { "success" } else { "error" };
    metrics::counter!(
        "store_operations_total",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "store_operation_duration_ms",
        "backend" => "sqlite",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

impl Store for SqliteStore {
    fn fetch_collections(&self) -> Result<Vec<String>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(sql::SELECT_COLLECTIONS)
            .map_err(sqlite_error("fetch_collections"))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sqlite_error("fetch_collections"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite_error("fetch_collections"))
    }

    #[instrument(skip(self), fields(backend = "sqlite"))]
    fn fetch_latest_records(
        &self,
        collection: &str,
        as_of: i64,
        doc_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Record>> {
        let start = Instant::now();
        let filter = NameFilter::compile(doc_filter);
        let result: Result<BTreeMap<String, Record>> = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(sql::SELECT_UP_TO)
                .map_err(sqlite_error("fetch_latest_records"))?;
            let mut rows = stmt
                .query(params![collection, as_of])
                .map_err(sqlite_error("fetch_latest_records"))?;

            let mut latest = BTreeMap::new();
            while let Some(row) = rows.next().map_err(sqlite_error("fetch_latest_records"))? {
                let doc: String = row.get(0).map_err(sqlite_error("fetch_latest_records"))?;
                if !filter.matches(&doc) {
                    continue;
                }
                let record = Record {
                    ts: row.get(1).map_err(sqlite_error("fetch_latest_records"))?,
                    data: row.get(2).map_err(sqlite_error("fetch_latest_records"))?,
                };
                latest.insert(doc, record);
            }
            Ok(latest)
        })();
        record_operation_metrics("fetch_latest_records", start, result.is_ok());
        result
    }

    #[instrument(skip(self), fields(backend = "sqlite"))]
    fn fetch_document(
        &self,
        collection: &str,
        document: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Record>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(sql::SELECT_DOCUMENT_RANGE)
                .map_err(sqlite_error("fetch_document"))?;
            let rows = stmt
                .query_map(params![collection, document, from, to], |row| {
                    Ok(Record {
                        ts: row.get(0)?,
                        data: row.get(1)?,
                    })
                })
                .map_err(sqlite_error("fetch_document"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sqlite_error("fetch_document"))
        })();
        record_operation_metrics("fetch_document", start, result.is_ok());
        result
    }

    fn get_values(&self, collection: &str, key_filter: Option<&str>) -> Result<KeyValueMap> {
        let filter = NameFilter::compile(key_filter);
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(sql::SELECT_VALUES)
            .map_err(sqlite_error("get_values"))?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(sqlite_error("get_values"))?;

        let mut values = KeyValueMap::new();
        for row in rows {
            let (key, value) = row.map_err(sqlite_error("get_values"))?;
            if filter.matches(&key) {
                values.insert(key, value);
            }
        }
        Ok(values)
    }

    fn set_value(&self, collection: &str, key: &str, value: &str) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute(sql::UPSERT_VALUE, params![collection, key, value])
            .map_err(sqlite_error("set_value"))?;
        Ok(())
    }

    #[instrument(skip(self, batch), fields(backend = "sqlite", batch.len = batch.len()))]
    fn insert_multiple_records(&self, batch: &[InsertRecord]) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            let mut conn = acquire_lock(&self.conn);
            let tx = conn
                .transaction()
                .map_err(sqlite_error("begin_transaction"))?;
            {
                let mut stmt = tx
                    .prepare_cached(sql::UPSERT_RECORD)
                    .map_err(sqlite_error("insert_records"))?;
                for record in batch {
                    stmt.execute(params![
                        record.ts,
                        record.collection,
                        record.document,
                        record.data
                    ])
                    .map_err(sqlite_error("insert_records"))?;
                }
            }
            tx.commit().map_err(sqlite_error("commit_transaction"))
        })();
        record_operation_metrics("insert_multiple_records", start, result.is_ok());
        result
    }

    fn list_api_keys(&self) -> Result<Vec<ApiKeyEntry>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(sql::SELECT_API_KEYS)
            .map_err(sqlite_error("list_api_keys"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(sqlite_error("list_api_keys"))?;

        let mut keys = Vec::new();
        for row in rows {
            let (key, raw_scope) = row.map_err(sqlite_error("list_api_keys"))?;
            let scope = ApiKeyScope::parse(&raw_scope).ok_or_else(|| Error::OperationFailed {
                operation: "list_api_keys".to_string(),
                cause: format!("key {key} has unknown scope {raw_scope:?}"),
            })?;
            keys.push(ApiKeyEntry { key, scope });
        }
        Ok(keys)
    }

    fn add_api_key(&self, key: &str, scope: ApiKeyScope) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute(sql::UPSERT_API_KEY, params![key, scope.as_str()])
            .map_err(sqlite_error("add_api_key"))?;
        Ok(())
    }
}
