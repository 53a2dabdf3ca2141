//! API key types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission level of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiKeyScope {
    /// Queries only.
    #[serde(rename = "readonly")]
    ReadOnly,
    /// Queries and inserts.
    #[serde(rename = "read_write")]
    ReadWrite,
    /// Queries, inserts and deletes.
    #[serde(rename = "read_write_delete")]
    ReadWriteDelete,
}

impl ApiKeyScope {
    /// Returns all scopes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ReadOnly, Self::ReadWrite, Self::ReadWriteDelete]
    }

    /// Returns the canonical wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "readonly",
            Self::ReadWrite => "read_write",
            Self::ReadWriteDelete => "read_write_delete",
        }
    }

    /// Parses a scope, ignoring case and the separators `_`, `-` and space.
    ///
    /// Returns `None` if the scope is not recognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "readonly" => Some(Self::ReadOnly),
            "readwrite" => Some(Self::ReadWrite),
            "readwritedelete" => Some(Self::ReadWriteDelete),
            _ => None,
        }
    }
}

impl fmt::Display for ApiKeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API key and its scope, as stored in `apikeys.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// Key identifier.
    pub key: String,
    /// Permission level.
    pub scope: ApiKeyScope,
}

impl ApiKeyEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(key: impl Into<String>, scope: ApiKeyScope) -> Self {
        Self {
            key: key.into(),
            scope,
        }
    }
}
