//! Legacy-format record parser.
//!
//! Legacy archives keep one directory per document, holding `.json` files
//! (at any depth) that contain either a single record object or an array
//! of them. Older writers used different timestamp field names and did not
//! always nest the payload under `data`, so each object is normalized:
//!
//! | Source | Timestamp | Payload |
//! |--------|-----------|---------|
//! | `ts`, `timestamp`, `time` (first present) | integer, float (truncated) or numeric string | |
//! | file stem | base-10 integer, when no field is present | |
//! | `data` string | | used verbatim |
//! | `data` other value | | compact JSON, keys and numbers as written |
//! | no `data` | | compact JSON of the whole object, top-level keys sorted |

use crate::io::traits::RecordSource;
use crate::models::Record;
use crate::{ArchiveError, ArchiveErrorKind, Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Timestamp fields, in priority order.
const TIMESTAMP_FIELDS: [&str; 3] = ["ts", "timestamp", "time"];

type LegacyObject = Map<String, Value>;

/// Top-level shapes a legacy file may take.
#[derive(Debug)]
enum LegacyShape {
    /// One record object.
    Single(LegacyObject),
    /// An array of record objects.
    Array(Vec<LegacyObject>),
}

impl LegacyShape {
    /// Decodes the trimmed, non-empty content of a legacy file.
    fn decode(path: &Path, content: &[u8]) -> Result<Self> {
        let json_error = |e: serde_json::Error| ArchiveError::new("decode", path, e.into());
        match content.first() {
            Some(b'[') => Ok(Self::Array(
                serde_json::from_slice(content).map_err(json_error)?,
            )),
            Some(b'{') => Ok(Self::Single(
                serde_json::from_slice(content).map_err(json_error)?,
            )),
            _ => Err(ArchiveError::new("decode", path, ArchiveErrorKind::UnexpectedShape).into()),
        }
    }

    fn into_records(self, path: &Path) -> Result<Vec<Record>> {
        match self {
            Self::Single(object) => Ok(vec![
                record_from_object(object, path).map_err(|kind| ArchiveError::new("parse", path, kind))?,
            ]),
            Self::Array(objects) => objects
                .into_iter()
                .enumerate()
                .map(|(index, object)| {
                    record_from_object(object, path).map_err(|kind| {
                        Error::from(ArchiveError::new("parse", path, kind).at_index(index))
                    })
                })
                .collect(),
        }
    }
}

/// Parses the raw bytes of one legacy file into records, in file order.
///
/// Empty or whitespace-only content yields no records.
///
/// # Errors
///
/// Returns an [`ArchiveError`] naming `path` (and the array index, for
/// array files) if the content is not an object or array of objects, or a
/// record has no usable timestamp.
pub fn parse_legacy_records(path: &Path, content: &[u8]) -> Result<Vec<Record>> {
    let trimmed = content.trim_ascii();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    LegacyShape::decode(path, trimmed)?.into_records(path)
}

/// Reads and parses one legacy file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_legacy_file(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read(path).map_err(|e| ArchiveError::io("read", path, e))?;
    parse_legacy_records(path, &content)
}

fn record_from_object(
    object: LegacyObject,
    path: &Path,
) -> std::result::Result<Record, ArchiveErrorKind> {
    let ts = extract_timestamp(&object, path)?;
    let data = extract_data(object)?;
    Ok(Record { ts, data })
}

fn extract_timestamp(
    object: &LegacyObject,
    path: &Path,
) -> std::result::Result<i64, ArchiveErrorKind> {
    if let Some((field, value)) = TIMESTAMP_FIELDS
        .iter()
        .find_map(|field| object.get(*field).map(|value| (*field, value)))
    {
        return timestamp_from_value(value)
            .map_err(|reason| ArchiveErrorKind::InvalidTimestamp { field, reason });
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<i64>().ok())
        .ok_or(ArchiveErrorKind::MissingTimestamp)
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_from_value(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("number {n} out of range")),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| format!("{s:?} is not an integer: {e}")),
        _ => Err("expected number or numeric string".to_string()),
    }
}

fn extract_data(mut object: LegacyObject) -> std::result::Result<String, ArchiveErrorKind> {
    match object.remove("data") {
        Some(Value::String(data)) => Ok(data),
        Some(other) => Ok(other.to_string()),
        None => {
            let sorted: BTreeMap<&str, &Value> =
                object.iter().map(|(key, value)| (key.as_str(), value)).collect();
            serde_json::to_string(&sorted).map_err(ArchiveErrorKind::from)
        },
    }
}

/// Collects the `.json` files (any case) below a legacy document
/// directory, at any depth, sorted by path.
///
/// # Errors
///
/// Returns an error if the directory tree cannot be walked.
pub fn collect_legacy_files(document_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(document_dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(document_dir).to_path_buf();
            ArchiveError::io("walk", path, e.into())
        })?;
        if entry.file_type().is_file() && has_json_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Whether `path` ends in `.json`, ignoring case.
pub(crate) fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Streams the records of one legacy document directory.
///
/// Files are parsed one at a time, in sorted path order, so only a single
/// file's records are held in memory.
pub struct LegacyDocumentSource {
    files: std::vec::IntoIter<PathBuf>,
    pending: std::vec::IntoIter<Record>,
}

impl LegacyDocumentSource {
    /// Creates a source over already collected files.
    #[must_use]
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
            pending: Vec::new().into_iter(),
        }
    }
}

impl RecordSource for LegacyDocumentSource {
    fn next(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.pending.next() {
                return Ok(Some(record));
            }
            let Some(path) = self.files.next() else {
                return Ok(None);
            };
            self.pending = read_legacy_file(&path)?.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(name: &str, content: &str) -> Result<Vec<Record>> {
        parse_legacy_records(Path::new(name), content.as_bytes())
    }

    #[test]
    fn test_array_preserves_order() {
        let records = parse("x.json", r#"[{"data":"a","ts":1},{"data":"b","ts":2}]"#).unwrap();
        assert_eq!(records, vec![Record::new(1, "a"), Record::new(2, "b")]);
    }

    #[test]
    fn test_ts_takes_precedence_over_timestamp() {
        let records = parse("x.json", r#"{"timestamp":5,"ts":3,"data":"a"}"#).unwrap();
        assert_eq!(records[0].ts, 3);
    }

    #[test_case(r#"{"ts":17,"data":"x"}"#, 17 ; "integer")]
    #[test_case(r#"{"ts":17.9,"data":"x"}"#, 17 ; "float truncated")]
    #[test_case(r#"{"ts":-2.5,"data":"x"}"#, -2 ; "negative float truncated toward zero")]
    #[test_case(r#"{"ts":"17","data":"x"}"#, 17 ; "numeric string")]
    #[test_case(r#"{"time":8,"data":"x"}"#, 8 ; "time field")]
    #[test_case(r#"{"timestamp":9,"time":8,"data":"x"}"#, 9 ; "timestamp before time")]
    fn test_timestamp_sources(content: &str, expected: i64) {
        assert_eq!(parse("doc.json", content).unwrap()[0].ts, expected);
    }

    #[test]
    fn test_timestamp_from_file_name() {
        let records = parse("dir/1771760190.json", r#"{"data":"x"}"#).unwrap();
        assert_eq!(records, vec![Record::new(1_771_760_190, "x")]);
    }

    #[test]
    fn test_missing_timestamp_reports_path_and_index() {
        let err = parse("doc/notes.json", r#"[{"ts":1,"data":"a"},{"data":"b"}]"#).unwrap_err();
        let Error::Archive(archive) = &err else {
            panic!("expected archive error, got {err:?}");
        };
        assert_eq!(archive.path, Path::new("doc/notes.json"));
        assert_eq!(archive.index, Some(1));
        assert!(matches!(archive.kind, ArchiveErrorKind::MissingTimestamp));
        assert!(err.to_string().contains("neither ts/timestamp/time field nor numeric filename"));
    }

    #[test_case(r#"{"ts":"soon","data":"x"}"# ; "non numeric string")]
    #[test_case(r#"{"ts":true,"data":"x"}"# ; "boolean")]
    #[test_case(r#"{"ts":null,"data":"x"}"# ; "null")]
    fn test_invalid_timestamp_value(content: &str) {
        let err = parse("123.json", content).unwrap_err();
        assert!(matches!(
            err.archive_kind(),
            Some(ArchiveErrorKind::InvalidTimestamp { field: "ts", .. })
        ));
    }

    #[test_case(r#"{"ts":1,"data":{"status": "ok"}}"#, r#"{"status":"ok"}"# ; "structured data compacted")]
    #[test_case(r#"{"ts":1,"data":"  raw text "}"#, "  raw text " ; "string data verbatim")]
    #[test_case(r#"{"ts":1,"data":[1, 2]}"#, "[1,2]" ; "array data compacted")]
    fn test_data_extraction(content: &str, expected: &str) {
        assert_eq!(parse("d.json", content).unwrap()[0].data, expected);
    }

    #[test]
    fn test_structured_data_kept_as_written() {
        let records = parse(
            "x.json",
            r#"{"ts":1,"data":{ "b": 1, "a": 2, "big": 123456789012345678901234, "f": 1.10, "e": 1e3 }}"#,
        )
        .unwrap();
        assert_eq!(
            records[0].data,
            r#"{"b":1,"a":2,"big":123456789012345678901234,"f":1.10,"e":1e3}"#
        );
    }

    #[test]
    fn test_flat_object_keeps_nested_values() {
        let records = parse("x.json", r#"{"z": {"y": 1, "x": 2.50}, "ts": 5, "a": [3, 1]}"#).unwrap();
        assert_eq!(records[0].ts, 5);
        assert_eq!(records[0].data, r#"{"a":[3,1],"ts":5,"z":{"y":1,"x":2.50}}"#);
    }

    #[test]
    fn test_flat_object_becomes_payload() {
        let records = parse("1771760190.json", r#"{ "status": "ok" }"#).unwrap();
        assert_eq!(records[0].data, r#"{"status":"ok"}"#);

        let records = parse("x.json", r#"{"ts": 4, "status": "ok"}"#).unwrap();
        assert_eq!(records[0].data, r#"{"status":"ok","ts":4}"#);
    }

    #[test_case("" ; "empty")]
    #[test_case("  \n\t" ; "whitespace")]
    fn test_blank_file_yields_nothing(content: &str) {
        assert!(parse("x.json", content).unwrap().is_empty());
    }

    #[test_case("42" ; "number")]
    #[test_case("\"text\"" ; "string")]
    fn test_unexpected_top_level(content: &str) {
        let err = parse("x.json", content).unwrap_err();
        assert!(matches!(err.archive_kind(), Some(ArchiveErrorKind::UnexpectedShape)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse("x.json", "{\"ts\":").unwrap_err();
        assert!(matches!(err.archive_kind(), Some(ArchiveErrorKind::Json(_))));
    }

    #[test]
    fn test_collect_and_stream_document_dir() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc-1");
        std::fs::create_dir_all(doc.join("nested")).unwrap();
        std::fs::write(doc.join("2.json"), r#"{"data":"second"}"#).unwrap();
        std::fs::write(doc.join("1.JSON"), r#"{"data":"first"}"#).unwrap();
        std::fs::write(doc.join("nested/3.json"), r#"[{"data":"third"}]"#).unwrap();
        std::fs::write(doc.join("readme.txt"), "ignored").unwrap();

        let files = collect_legacy_files(&doc).unwrap();
        assert_eq!(files.len(), 3);

        let mut source = LegacyDocumentSource::new(files);
        let mut data = Vec::new();
        while let Some(record) = source.next().unwrap() {
            data.push(record.data);
        }
        assert_eq!(data, ["first", "second", "third"]);
    }
}
