//! Fuzz target for the event sweep and the analyses built on it.
//!
//! Checks the bounds every analysis must respect for arbitrary interval
//! sets: the worst case never exceeds the interval count and the average
//! never exceeds the worst case.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, Utc};
use libfuzzer_sys::fuzz_target;
use tc_common::{Interval, SubjectId};
use tc_engine::{
    build_concurrency_histogram, compute_concurrency_stats, extract_peak_occurrences,
    extract_peak_periods,
};

#[derive(Debug, Arbitrary)]
struct Session {
    user: u8,
    start: u16,
    length: u16,
}

#[derive(Debug, Arbitrary)]
struct Input {
    sessions: Vec<Session>,
    bin_size: u8,
    units_per_resource: u8,
    threshold: i8,
}

fn instant(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default()
}

fuzz_target!(|input: Input| {
    let intervals: Vec<Interval> = input
        .sessions
        .iter()
        .filter_map(|s| {
            let start = i64::from(s.start);
            Interval::new(
                SubjectId::new(format!("u{}", s.user)),
                instant(start),
                instant(start + i64::from(s.length)),
            )
            .ok()
        })
        .collect();

    let stats = compute_concurrency_stats(&intervals);
    assert!(stats.worst_case <= intervals.len());
    assert!(stats.average_case <= stats.worst_case);

    let bin = u32::from(input.bin_size);
    let units = u32::from(input.units_per_resource);
    if let Ok(buckets) = build_concurrency_histogram(&intervals, bin, units) {
        assert!(buckets.windows(2).all(|w| w[0].low < w[1].low));
    }
    if let Ok(periods) = extract_peak_periods(&intervals, i64::from(input.threshold), units) {
        assert!(periods.iter().all(|p| p.start <= p.end));
    }
    let _ = extract_peak_occurrences(&intervals, u64::from(input.threshold.unsigned_abs()), units);
});
