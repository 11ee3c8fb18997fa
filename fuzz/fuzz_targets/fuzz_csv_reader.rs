//! Fuzz target for the CSV source reader.
//!
//! Arbitrary bytes, including unterminated quotes and ragged rows, must
//! produce records or an error, never a panic.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tc_core::ingest::{read_records, SourceFormat};

fuzz_target!(|data: &[u8]| {
    for delimiter in [',', ';', '\t'] {
        if let Ok(records) = read_records(Cursor::new(data), SourceFormat::Csv, delimiter) {
            for (idx, record) in records.iter().enumerate() {
                assert_eq!(record.row, idx + 1);
            }
        }
    }
});
