//! Schema and statements for the `SQLite` store.
//!
//! The schema matches the FluxionDB server's on-disk database, so a server
//! data file can be opened directly.

/// Tables and indexes, created if missing.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    doc TEXT NOT NULL,
    ts INTEGER NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY(collection, doc, ts)
);
CREATE TABLE IF NOT EXISTS key_values (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY(collection, key)
);
CREATE TABLE IF NOT EXISTS api_keys (
    api_key TEXT PRIMARY KEY,
    scope TEXT NOT NULL,
    deletable INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_collection_doc_ts ON records(collection, doc, ts);
CREATE INDEX IF NOT EXISTS idx_records_collection_ts ON records(collection, ts);
";

pub const SELECT_COLLECTIONS: &str = "SELECT DISTINCT collection FROM records
     UNION SELECT DISTINCT collection FROM key_values
     ORDER BY collection";

/// Ordered so that the last row per document is its latest record.
pub const SELECT_UP_TO: &str = "SELECT doc, ts, data FROM records
     WHERE collection = ?1 AND ts <= ?2
     ORDER BY doc ASC, ts ASC";

pub const SELECT_DOCUMENT_RANGE: &str = "SELECT ts, data FROM records
     WHERE collection = ?1 AND doc = ?2 AND ts >= ?3 AND ts <= ?4
     ORDER BY ts ASC";

pub const SELECT_VALUES: &str = "SELECT key, value FROM key_values WHERE collection = ?1";

pub const UPSERT_VALUE: &str =
    "INSERT OR REPLACE INTO key_values (collection, key, value) VALUES (?1, ?2, ?3)";

pub const UPSERT_RECORD: &str =
    "INSERT OR REPLACE INTO records (ts, collection, doc, data) VALUES (?1, ?2, ?3, ?4)";

pub const SELECT_API_KEYS: &str = "SELECT api_key, scope FROM api_keys ORDER BY api_key";

pub const UPSERT_API_KEY: &str =
    "INSERT OR REPLACE INTO api_keys (api_key, scope, deletable) VALUES (?1, ?2, 1)";
