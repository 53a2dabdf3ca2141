//! Property-based tests for the archive codecs.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Document names survive encode then decode
//! - Encoded names are flat, non-empty file names
//! - Batch sizes follow the record count exactly
//! - Archive lines preserve arbitrary payloads

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use fluxion_archive::io::formats::{JsonlSource, JsonlWriter};
use fluxion_archive::io::naming::{decode_document_name, document_file_name, encode_document_name};
use fluxion_archive::io::{BATCH_SIZE, BatchSink, RecordSink, RecordSource};
use fluxion_archive::models::Record;
use fluxion_archive::storage::MemoryStore;
use proptest::prelude::*;
use std::io::Cursor;

proptest! {
    /// Property: every non-empty name round-trips through its file name.
    #[test]
    fn prop_document_name_roundtrip(name in "\\PC{1,40}") {
        let file = document_file_name(&name);
        prop_assert_eq!(decode_document_name(&file), Some(name));
    }

    /// Property: encoded names contain only file-name-safe characters.
    #[test]
    fn prop_encoded_name_is_flat(name in "\\PC{0,40}") {
        let encoded = encode_document_name(&name);
        prop_assert!(!encoded.is_empty());
        prop_assert!(encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_.~%".contains(&b)));
    }

    /// Property: decoding never panics on arbitrary file names.
    #[test]
    fn prop_decode_total(file in "\\PC{0,40}") {
        let _ = decode_document_name(&file);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: 500k + r records produce k full batches plus one of r.
    #[test]
    fn prop_batch_boundaries(k in 0usize..4, r in 0usize..BATCH_SIZE) {
        let store = MemoryStore::new();
        let mut sink = BatchSink::new(&store, "c", "d");
        let total = k * BATCH_SIZE + r;
        for i in 0..total {
            sink.push(Record::new(i64::try_from(i).unwrap(), String::new())).unwrap();
        }
        prop_assert_eq!(sink.finish().unwrap(), total);

        let calls = store.insert_calls();
        prop_assert_eq!(calls.len(), k + usize::from(r > 0));
        prop_assert!(calls.iter().all(|&size| size <= BATCH_SIZE));
        if let Some(&last) = calls.last() {
            prop_assert_eq!(last, if r > 0 { r } else { BATCH_SIZE });
        }

        let stored = store.records("c", "d");
        prop_assert!(stored.iter().enumerate().all(|(i, rec)| rec.ts == i64::try_from(i).unwrap()));
    }
}

proptest! {
    /// Property: records written to an archive read back identically and in order.
    #[test]
    fn prop_jsonl_preserves_records(
        records in prop::collection::vec((any::<i64>(), "\\PC{0,30}"), 0..20),
        document in "\\PC{1,20}",
    ) {
        let records: Vec<Record> = records.into_iter().map(|(ts, data)| Record::new(ts, data)).collect();

        let mut buffer = Vec::new();
        let mut sink = JsonlWriter::new(&mut buffer, "doc.jsonl", document.clone());
        for record in &records {
            sink.write(record).unwrap();
        }
        prop_assert_eq!(Box::new(sink).finalize().unwrap(), records.len());

        let mut source = JsonlSource::new(Cursor::new(buffer), "doc.jsonl", document);
        let mut read = Vec::new();
        while let Some(record) = source.next().unwrap() {
            read.push(record);
        }
        prop_assert_eq!(read, records);
    }
}
