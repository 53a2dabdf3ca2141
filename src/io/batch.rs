//! Batched ingestion.

use crate::Result;
use crate::models::{InsertRecord, Record};
use crate::storage::Store;

/// Maximum number of records sent in one `insert_multiple_records` call.
pub const BATCH_SIZE: usize = 500;

/// Buffers the records of one document and inserts them in batches of
/// [`BATCH_SIZE`], in push order.
///
/// A failed insert is returned immediately. Batches flushed before the
/// failure stay in the store.
///
/// # Example
///
/// ```rust,ignore
/// let mut sink = BatchSink::new(&store, "sensors", "device-1");
/// for record in records {
///     sink.push(record)?;
/// }
/// let inserted = sink.finish()?;
/// ```
pub struct BatchSink<'a, S: Store + ?Sized> {
    store: &'a S,
    collection: &'a str,
    document: &'a str,
    buffer: Vec<InsertRecord>,
    /// Records inserted so far.
    flushed: usize,
}

impl<'a, S: Store + ?Sized> BatchSink<'a, S> {
    /// Creates a sink addressing `collection`/`document`.
    pub fn new(store: &'a S, collection: &'a str, document: &'a str) -> Self {
        Self {
            store,
            collection,
            document,
            buffer: Vec::with_capacity(BATCH_SIZE),
            flushed: 0,
        }
    }

    /// Buffers `record`, inserting the buffer once it is full.
    ///
    /// # Errors
    ///
    /// Returns the store error if a full batch cannot be inserted.
    pub fn push(&mut self, record: Record) -> Result<()> {
        self.buffer
            .push(InsertRecord::new(self.collection, self.document, record));
        if self.buffer.len() >= BATCH_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    /// Inserts any remaining records and returns the total inserted.
    ///
    /// # Errors
    ///
    /// Returns the store error if the remainder cannot be inserted.
    pub fn finish(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.flushed)
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.store.insert_multiple_records(&self.buffer)?;

        let len = self.buffer.len();
        self.flushed += len;
        self.buffer.clear();

        metrics::counter!("archive_batches_flushed_total").increment(1);
        metrics::counter!("archive_records_imported_total").increment(len as u64);
        tracing::debug!(
            collection = self.collection,
            document = self.document,
            batch_size = len,
            "flushed batch"
        );
        Ok(())
    }
}
