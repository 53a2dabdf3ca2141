//! Current-format archive codec.
//!
//! One `.jsonl` file per document, one compact `{"ts","doc","data"}` object
//! per line, in the order the records were produced.

use crate::io::traits::{RecordSink, RecordSource};
use crate::models::{ArchiveLine, Record};
use crate::{ArchiveError, ArchiveErrorKind, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Reads the records of one document from a `.jsonl` archive.
///
/// Blank lines are skipped. A line whose `doc` names a different document
/// than the file fails with [`ArchiveErrorKind::DocumentMismatch`]; a line
/// without `doc`, or with an empty one, belongs to the file's document.
pub struct JsonlSource<R: BufRead> {
    reader: R,
    path: PathBuf,
    document: String,
    /// Lines consumed so far, blank ones included.
    line_number: usize,
    line: String,
}

impl JsonlSource<BufReader<File>> {
    /// Opens the archive at `path` for `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path, document: impl Into<String>) -> Result<Self> {
        let file = File::open(path).map_err(|e| ArchiveError::io("open", path, e))?;
        Ok(Self::new(BufReader::new(file), path, document))
    }
}

impl<R: BufRead> JsonlSource<R> {
    /// Wraps a reader; `path` is only used in error reports.
    pub fn new(reader: R, path: impl Into<PathBuf>, document: impl Into<String>) -> Self {
        Self {
            reader,
            path: path.into(),
            document: document.into(),
            line_number: 0,
            line: String::new(),
        }
    }

    fn error(&self, kind: ArchiveErrorKind) -> ArchiveError {
        ArchiveError::new("decode", &self.path, kind).at_index(self.line_number - 1)
    }
}

impl<R: BufRead> RecordSource for JsonlSource<R> {
    fn next(&mut self) -> Result<Option<Record>> {
        loop {
            self.line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| ArchiveError::io("read", &self.path, e))?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line: ArchiveLine =
                serde_json::from_str(trimmed).map_err(|e| self.error(e.into()))?;
            if let Some(found) = line.doc.as_deref().filter(|doc| !doc.is_empty())
                && found != self.document
            {
                return Err(self
                    .error(ArchiveErrorKind::DocumentMismatch {
                        expected: self.document.clone(),
                        found: found.to_string(),
                    })
                    .into());
            }
            return Ok(Some(line.into_record()));
        }
    }
}

/// Writes the records of one document as a `.jsonl` archive.
pub struct JsonlWriter<W: Write> {
    writer: W,
    path: PathBuf,
    document: String,
    /// Number of records written.
    count: usize,
}

impl JsonlWriter<BufWriter<File>> {
    /// Creates (or truncates) the archive at `path` for `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path, document: impl Into<String>) -> Result<Self> {
        let file = File::create(path).map_err(|e| ArchiveError::io("create", path, e))?;
        Ok(Self::new(BufWriter::new(file), path, document))
    }
}

impl<W: Write> JsonlWriter<W> {
    /// Wraps a writer; `path` is only used in error reports.
    pub fn new(writer: W, path: impl Into<PathBuf>, document: impl Into<String>) -> Self {
        Self {
            writer,
            path: path.into(),
            document: document.into(),
            count: 0,
        }
    }
}

impl<W: Write> RecordSink for JsonlWriter<W> {
    fn write(&mut self, record: &Record) -> Result<()> {
        let line = ArchiveLine::for_record(&self.document, record);
        serde_json::to_writer(&mut self.writer, &line)
            .map_err(|e| ArchiveError::new("encode", &self.path, e.into()))?;
        writeln!(self.writer).map_err(|e| ArchiveError::io("write", &self.path, e))?;
        self.count += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<usize> {
        self.writer
            .flush()
            .map_err(|e| ArchiveError::io("flush", &self.path, e))?;
        Ok(self.count)
    }
}
