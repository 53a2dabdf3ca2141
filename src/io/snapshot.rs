//! Key/value and API key snapshot files.
//!
//! Both are single pretty-printed JSON documents terminated by a newline.
//! A zero-byte (or whitespace-only) file, or one holding `null`, reads as
//! empty.

use crate::io::naming::{API_KEYS_FILE, KEY_VALUE_FILE};
use crate::models::{ApiKeyEntry, ApiKeyScope, KeyValueMap};
use crate::{ArchiveError, ArchiveErrorKind, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An `apikeys.json` entry before its scope is validated.
#[derive(Debug, Deserialize)]
struct RawApiKey {
    #[serde(default)]
    key: String,
    #[serde(default)]
    scope: String,
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(|e| ArchiveError::new("encode", path, e.into()))?;
    json.push('\n');
    fs::write(path, json).map_err(|e| ArchiveError::io("write", path, e))?;
    Ok(())
}

/// Reads `path`, returning `None` if it does not exist.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ArchiveError::io("read", path, e).into()),
    }
}

/// Writes `values` to `<collection_dir>/key_value.json`.
///
/// An empty map is written as `{}`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_key_values(collection_dir: &Path, values: &KeyValueMap) -> Result<PathBuf> {
    let path = collection_dir.join(KEY_VALUE_FILE);
    write_pretty(&path, values)?;
    Ok(path)
}

/// Reads `<collection_dir>/key_value.json`.
///
/// A missing file reads as an empty map.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or decoded.
pub fn read_key_values(collection_dir: &Path) -> Result<KeyValueMap> {
    let path = collection_dir.join(KEY_VALUE_FILE);
    let Some(content) = read_optional(&path)? else {
        return Ok(KeyValueMap::new());
    };
    if content.trim().is_empty() {
        return Ok(KeyValueMap::new());
    }
    let values: Option<KeyValueMap> = serde_json::from_str(&content)
        .map_err(|e| ArchiveError::new("decode", &path, e.into()))?;
    Ok(values.unwrap_or_default())
}

/// Writes `keys` to `<root>/apikeys.json`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_api_keys(root: &Path, keys: &[ApiKeyEntry]) -> Result<PathBuf> {
    let path = root.join(API_KEYS_FILE);
    write_pretty(&path, keys)?;
    Ok(path)
}

/// Reads `<root>/apikeys.json`.
///
/// Scopes are normalized with [`ApiKeyScope::parse`]; entries with an empty
/// key are dropped.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file is missing, and an archive error
/// if it cannot be decoded or an entry has an unknown scope.
pub fn read_api_keys(root: &Path) -> Result<Vec<ApiKeyEntry>> {
    let path = root.join(API_KEYS_FILE);
    let Some(content) = read_optional(&path)? else {
        return Err(Error::NotFound {
            what: "api keys file",
            path,
        });
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Option<Vec<RawApiKey>> = serde_json::from_str(&content)
        .map_err(|e| ArchiveError::new("decode", &path, e.into()))?;

    raw.unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| !entry.key.is_empty())
        .map(|(index, entry)| match ApiKeyScope::parse(&entry.scope) {
            Some(scope) => Ok(ApiKeyEntry::new(entry.key, scope)),
            None => Err(Error::from(
                ArchiveError::new(
                    "parse",
                    &path,
                    ArchiveErrorKind::InvalidScope {
                        key: entry.key,
                        scope: entry.scope,
                    },
                )
                .at_index(index),
            )),
        })
        .collect()
}
