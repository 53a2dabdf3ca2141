//! Document name codec and archive file names.
//!
//! Document names are arbitrary strings. On disk each document becomes
//! `<encoded name>.jsonl`, where every byte outside `[A-Za-z0-9._~-]` is
//! percent-encoded, so names containing `/`, spaces or non-ASCII text map
//! to a single flat file name and back.
//!
//! Collection names keep their `/` separators and become nested
//! directories below the archive root.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Suffix of current-format document archives.
pub const DOCUMENT_EXT: &str = ".jsonl";

/// Per-collection key/value snapshot.
pub const KEY_VALUE_FILE: &str = "key_value.json";

/// Root-level API key snapshot.
pub const API_KEYS_FILE: &str = "apikeys.json";

/// File stem used for a document whose encoded name would be empty.
///
/// A document literally named `_` encodes to the same stem, and both
/// decode back to `_`.
pub const EMPTY_NAME_PLACEHOLDER: &str = "_";

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

const fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// Encodes a document name into a file stem (without [`DOCUMENT_EXT`]).
#[must_use]
pub fn encode_document_name(name: &str) -> String {
    if name.is_empty() {
        return EMPTY_NAME_PLACEHOLDER.to_string();
    }

    let mut encoded = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        if is_unreserved(byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX_UPPER[usize::from(byte >> 4)]));
            encoded.push(char::from(HEX_UPPER[usize::from(byte & 0x0F)]));
        }
    }
    encoded
}

/// Returns the archive file name for a document.
#[must_use]
pub fn document_file_name(name: &str) -> String {
    format!("{}{DOCUMENT_EXT}", encode_document_name(name))
}

/// Resolves the directory of `collection` below `root`.
///
/// Each non-empty `/`-separated segment becomes one directory level, so a
/// leading `/` never escapes `root`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a segment is `..` or otherwise not a
/// plain directory name, or if no segment remains.
pub fn collection_dir(root: &Path, collection: &str) -> Result<PathBuf> {
    let mut dir = root.to_path_buf();
    let mut depth = 0;
    for segment in collection.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => {
                dir.push(part);
                depth += 1;
            },
            _ => {
                return Err(Error::InvalidInput(format!(
                    "collection {collection:?} does not stay inside {}",
                    root.display()
                )));
            },
        }
    }
    if depth == 0 {
        return Err(Error::InvalidInput(format!(
            "collection {collection:?} has no directory name"
        )));
    }
    Ok(dir)
}

/// Decodes an archive file name back into a document name.
///
/// Returns `None` when the file is not a document archive: the suffix is
/// missing, the stem is empty, an escape is malformed, or the decoded bytes
/// are not UTF-8.
#[must_use]
pub fn decode_document_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(DOCUMENT_EXT)?;
    if stem.is_empty() {
        return None;
    }
    percent_decode(stem)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            decoded.push((hi << 4) | lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
