//! Property-based tests for sweep and merge invariants.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use tc_common::{Interval, SubjectId};
use tc_engine::{
    build_concurrency_histogram, compute_concurrency_stats, extract_peak_occurrences,
    extract_peak_periods, merged_duration_seconds, CancellationToken, Checkpoint, EventSweep,
    HistogramAnalysis, PeakPeriodAnalysis, ResourceModel, SweepAnalysis,
};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("in range")
}

fn interval_strategy() -> impl Strategy<Value = Interval> {
    // Small subject and time domains so ties and overlaps are common.
    (0u8..6, 0i64..500, 0i64..200).prop_map(|(who, start, len)| {
        Interval::new(
            SubjectId::new(format!("user{who}")),
            at(start),
            at(start + len),
        )
        .expect("start <= end")
    })
}

fn intervals_strategy() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec(interval_strategy(), 0..60)
}

fn shuffled_pair() -> impl Strategy<Value = (Vec<Interval>, Vec<Interval>)> {
    intervals_strategy().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn results_do_not_depend_on_input_order((original, shuffled) in shuffled_pair()) {
        prop_assert_eq!(
            compute_concurrency_stats(&original),
            compute_concurrency_stats(&shuffled)
        );
        prop_assert_eq!(
            build_concurrency_histogram(&original, 2, 3).unwrap(),
            build_concurrency_histogram(&shuffled, 2, 3).unwrap()
        );
        prop_assert_eq!(
            extract_peak_periods(&original, 2, 1).unwrap(),
            extract_peak_periods(&shuffled, 2, 1).unwrap()
        );
        prop_assert_eq!(
            extract_peak_occurrences(&original, 2, 1).unwrap(),
            extract_peak_occurrences(&shuffled, 2, 1).unwrap()
        );
    }

    #[test]
    fn repeated_runs_are_identical(data in intervals_strategy()) {
        prop_assert_eq!(compute_concurrency_stats(&data), compute_concurrency_stats(&data));
        prop_assert_eq!(
            extract_peak_periods(&data, 1, 3).unwrap(),
            extract_peak_periods(&data, 1, 3).unwrap()
        );
    }

    #[test]
    fn worst_case_bounds_average(data in intervals_strategy()) {
        let stats = compute_concurrency_stats(&data);
        prop_assert!(stats.worst_case >= stats.average_case);
        prop_assert!(stats.worst_case <= data.len());
    }

    #[test]
    fn histogram_counts_every_busy_gap(data in intervals_strategy(), bin in 1u32..5, per in 1u32..5) {
        let sweep = EventSweep::build(&data);
        let steps: Vec<_> = sweep.steps().collect();
        let busy_gaps = steps
            .windows(2)
            .filter(|w| w[0].active > 0)
            .count() as u64;
        let busy_seconds: i64 = steps
            .windows(2)
            .filter(|w| w[0].active > 0)
            .map(|w| w[1].time - w[0].time)
            .sum();

        let buckets = build_concurrency_histogram(&data, bin, per).unwrap();
        let counted: u64 = buckets.iter().map(|b| b.occurrence_count).sum();
        let seconds: i64 = buckets.iter().map(|b| b.total_duration_seconds).sum();
        prop_assert_eq!(counted, busy_gaps);
        prop_assert_eq!(seconds, busy_seconds);
        prop_assert!(buckets.windows(2).all(|w| w[0].low < w[1].low));
    }

    #[test]
    fn periods_are_ordered_and_disjoint(data in intervals_strategy(), threshold in 0i64..4) {
        let periods = extract_peak_periods(&data, threshold, 1).unwrap();
        for p in &periods {
            prop_assert!(p.start <= p.end);
            prop_assert_eq!(p.duration_seconds, (p.end - p.start).num_seconds());
        }
        for w in periods.windows(2) {
            prop_assert!(w[0].end <= w[1].start);
        }
    }

    #[test]
    fn merged_duration_is_bounded(data in intervals_strategy()) {
        let merged = merged_duration_seconds(&data);
        let sum: i64 = data.iter().map(|iv| iv.duration_seconds()).sum();
        let longest = data.iter().map(|iv| iv.duration_seconds()).max().unwrap_or(0);
        prop_assert!(merged <= sum);
        prop_assert!(merged >= longest);
    }

    #[test]
    fn slice_length_never_changes_results(data in intervals_strategy(), slice in 1usize..8) {
        let token = CancellationToken::new();
        let sweep = EventSweep::build(&data);
        let model = ResourceModel::new(2).unwrap();

        let histogram = HistogramAnalysis::new(2, model).unwrap();
        let sliced = histogram.analyze(&sweep, &mut Checkpoint::new(&token, slice)).unwrap();
        prop_assert_eq!(sliced, histogram.run(&data).unwrap());

        let periods = PeakPeriodAnalysis::new(1, model);
        let sliced = periods.analyze(&sweep, &mut Checkpoint::new(&token, slice)).unwrap();
        prop_assert_eq!(sliced, periods.run(&data).unwrap());
    }
}

#[test]
fn threshold_zero_covers_whole_dataset() {
    let data = vec![
        Interval::new(SubjectId::new("a"), at(100), at(200)).unwrap(),
        Interval::new(SubjectId::new("b"), at(300), at(450)).unwrap(),
    ];
    let periods = extract_peak_periods(&data, 0, 3).unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start, at(100));
    assert_eq!(periods[0].end, at(450));
}
