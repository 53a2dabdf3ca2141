//! Core traits for archive reading and writing.
//!
//! Both archive layouts reduce to a [`RecordSource`] per document on import,
//! and export writes each document through a [`RecordSink`].

use crate::Result;
use crate::models::Record;

/// A stream of records for one document.
///
/// # Example
///
/// ```rust,ignore
/// use fluxion_archive::io::RecordSource;
///
/// while let Some(record) = source.next()? {
///     sink.push(record)?;
/// }
/// ```
pub trait RecordSource {
    /// Returns the next record, or `None` at the end of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying file cannot be read or decoded.
    fn next(&mut self) -> Result<Option<Record>>;
}

/// A destination for the records of one document.
pub trait RecordSink {
    /// Writes a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn write(&mut self, record: &Record) -> Result<()>;

    /// Flushes and closes the sink, returning the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output cannot be flushed.
    fn finalize(self: Box<Self>) -> Result<usize>;
}
