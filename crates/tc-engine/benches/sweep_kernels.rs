//! Criterion benchmarks for `tc-engine`.
//!
//! Focus on the sweep itself and the analyses that walk it.

use chrono::DateTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tc_common::{Interval, SubjectId};
use tc_engine::{
    build_concurrency_histogram, compute_concurrency_stats, extract_peak_periods,
    merged_duration_seconds, EventSweep,
};

/// Deterministic workload: `n` sessions over a working day, 40 distinct users.
fn workload(n: usize) -> Vec<Interval> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    (0..n)
        .map(|i| {
            let start = 1_709_280_000 + (next() % 36_000) as i64;
            let len = (next() % 7_200) as i64;
            Interval::new(
                SubjectId::new(format!("user{}", i % 40)),
                DateTime::from_timestamp(start, 0).unwrap(),
                DateTime::from_timestamp(start + len, 0).unwrap(),
            )
            .unwrap()
        })
        .collect()
}

fn bench_sweep_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for n in [1_000usize, 10_000, 100_000] {
        let data = workload(n);

        group.bench_with_input(BenchmarkId::new("build", n), &data, |b, data| {
            b.iter(|| black_box(EventSweep::build(black_box(data)).events().len()));
        });

        group.bench_with_input(BenchmarkId::new("stats", n), &data, |b, data| {
            b.iter(|| black_box(compute_concurrency_stats(black_box(data))));
        });

        group.bench_with_input(BenchmarkId::new("histogram", n), &data, |b, data| {
            b.iter(|| black_box(build_concurrency_histogram(black_box(data), 2, 3)));
        });

        group.bench_with_input(BenchmarkId::new("periods", n), &data, |b, data| {
            b.iter(|| black_box(extract_peak_periods(black_box(data), 5, 3)));
        });

        group.bench_with_input(BenchmarkId::new("merge", n), &data, |b, data| {
            b.iter(|| black_box(merged_duration_seconds(black_box(data))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sweep_kernels);
criterion_main!(benches);
