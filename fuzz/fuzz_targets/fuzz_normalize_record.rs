//! Fuzz target for record normalization.
//!
//! Any combination of cell values must either normalize into a
//! well-ordered interval or be rejected with a reason.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tc_common::{RawRecord, SourceSchema};
use tc_engine::Normalizer;

#[derive(Debug, Arbitrary)]
struct Cells {
    user: String,
    product: Option<String>,
    server: Option<String>,
    start_date: Option<String>,
    start_timestamp: Option<String>,
    end_date: Option<String>,
    end_timestamp: Option<String>,
    duration: Option<String>,
}

fuzz_target!(|cells: Cells| {
    let mut record = RawRecord::new(1).with("USER", &cells.user);
    let optional = [
        ("PRODUCT", &cells.product),
        ("SERVER", &cells.server),
        ("START DATE", &cells.start_date),
        ("START TIMESTAMP", &cells.start_timestamp),
        ("END DATE", &cells.end_date),
        ("END TIMESTAMP", &cells.end_timestamp),
        ("DURATION", &cells.duration),
    ];
    for (column, value) in optional {
        if let Some(value) = value {
            record = record.with(column, value);
        }
    }

    if let Ok(normalized) = Normalizer::new(SourceSchema::default()).normalize(&record) {
        assert!(normalized.interval.start <= normalized.interval.end);
    }
});
