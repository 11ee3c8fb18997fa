//! Fuzz target for JSON array and JSON Lines source readers.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use tc_core::ingest::{read_records, SourceFormat};

fuzz_target!(|data: &[u8]| {
    let _ = read_records(Cursor::new(data), SourceFormat::Jsonl, ',');
    let _ = read_records(Cursor::new(data), SourceFormat::Json, ',');
});
