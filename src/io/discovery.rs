//! Collection discovery.
//!
//! Collection names may contain `/`; such collections are stored as nested
//! directories, so "import everything" walks the whole tree and reports
//! every qualifying directory by its path relative to the root.

use crate::io::formats::Format;
use crate::io::formats::legacy::has_json_extension;
use crate::io::naming::{DOCUMENT_EXT, KEY_VALUE_FILE};
use crate::{ArchiveError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether `dir` directly holds `key_value.json` or a `.jsonl` archive.
#[must_use]
pub fn is_current_collection_dir(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
        .any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name == KEY_VALUE_FILE || name.ends_with(DOCUMENT_EXT)
        })
}

/// Whether `dir` directly holds `key_value.json`, or has a subdirectory
/// directly holding a `.json` file.
#[must_use]
pub fn is_legacy_collection_dir(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(std::result::Result::ok).any(|entry| {
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            has_direct_json_file(&entry.path())
        } else {
            entry.file_name() == KEY_VALUE_FILE
        }
    })
}

fn has_direct_json_file(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
        .any(|entry| has_json_extension(&entry.path()))
}

/// Tests `dir` with the qualification rule of `format`.
#[must_use]
pub fn is_collection_dir(dir: &Path, format: Format) -> bool {
    match format {
        Format::Current => is_current_collection_dir(dir),
        Format::Legacy => is_legacy_collection_dir(dir),
    }
}

/// Discovers every collection below `root`, sorted.
///
/// Uses an explicit work stack, so depth is bounded only by the heap. A
/// qualifying directory is still descended into; the root itself never
/// qualifies.
///
/// # Errors
///
/// Returns an error if a visited directory cannot be listed.
pub fn discover_collections(root: &Path, format: Format) -> Result<Vec<String>> {
    let mut pending: Vec<PathBuf> = subdirectories(root)?;
    let mut found = BTreeSet::new();

    while let Some(dir) = pending.pop() {
        pending.extend(subdirectories(&dir)?);

        if !is_collection_dir(&dir, format) {
            continue;
        }
        let Some(name) = collection_name(root, &dir) else {
            continue;
        };
        tracing::debug!(collection = %name, "discovered collection");
        found.insert(name);
    }

    Ok(found.into_iter().collect())
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ArchiveError::io("read", dir, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io("read", dir, e))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Relative path of `dir` under `root`, joined with `/`.
fn collection_name(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_current_dir_rules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/doc.jsonl");
        touch(dir.path(), "b/key_value.json");
        touch(dir.path(), "c/notes.txt");
        fs::create_dir_all(dir.path().join("d/sub.jsonl")).unwrap();

        assert!(is_current_collection_dir(&dir.path().join("a")));
        assert!(is_current_collection_dir(&dir.path().join("b")));
        assert!(!is_current_collection_dir(&dir.path().join("c")));
        assert!(!is_current_collection_dir(&dir.path().join("d")));
        assert!(!is_current_collection_dir(&dir.path().join("missing")));
    }

    #[test]
    fn test_legacy_dir_rules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/doc/1.JSON");
        touch(dir.path(), "b/key_value.json");
        touch(dir.path(), "c/loose.json");

        assert!(is_legacy_collection_dir(&dir.path().join("a")));
        assert!(is_legacy_collection_dir(&dir.path().join("b")));
        assert!(!is_legacy_collection_dir(&dir.path().join("c")));
    }

    #[test]
    fn test_nested_collections_are_all_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "team/key_value.json");
        touch(dir.path(), "team/prod/server.jsonl");
        touch(dir.path(), "key_value.json");

        let found = discover_collections(dir.path(), Format::Current).unwrap();
        assert_eq!(found, ["team", "team/prod"]);
    }

    #[test]
    fn test_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_collections(dir.path(), Format::Legacy).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_collections(&dir.path().join("nope"), Format::Current).is_err());
    }
}
