//! Duration-weighted histogram of resource-unit usage.
//!
//! Every gap between consecutive steps where at least one session is active
//! lands in exactly one bucket. Buckets are ranges of resource units of width
//! `bin_size`, starting at 1: with `bin_size = 2` the ranges are `1-2`,
//! `3-4`, `5-6`, and so on. Nothing accrues after the final step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cancel::Checkpoint;
use crate::resource::ResourceModel;
use crate::sweep::{EventSweep, SweepAnalysis};
use tc_common::{Error, Interval, Result};

/// Default bucket width in resource units.
pub const DEFAULT_BIN_SIZE: u32 = 2;

/// One range of resource units and the time spent in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// `"{low}-{high}"`, e.g. `"3-4"`.
    pub range_label: String,
    pub low: u64,
    pub high: u64,
    /// Gaps spent in this range.
    pub occurrence_count: u64,
    /// Seconds spent in this range.
    pub total_duration_seconds: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct HistogramAnalysis {
    bin_size: u32,
    model: ResourceModel,
}

impl HistogramAnalysis {
    pub fn new(bin_size: u32, model: ResourceModel) -> Result<Self> {
        if bin_size == 0 {
            return Err(Error::invalid_parameter(
                "bin_size",
                bin_size,
                "must be positive",
            ));
        }
        Ok(HistogramAnalysis { bin_size, model })
    }

    /// Lower bound of the bucket holding `units` (which must be >= 1).
    fn bucket_low(&self, units: u64) -> u64 {
        let bin = u64::from(self.bin_size);
        ((units - 1) / bin) * bin + 1
    }
}

impl SweepAnalysis for HistogramAnalysis {
    type Output = Vec<HistogramBucket>;

    fn analyze(
        &self,
        sweep: &EventSweep<'_>,
        checkpoint: &mut Checkpoint<'_>,
    ) -> Result<Vec<HistogramBucket>> {
        checkpoint.check()?;
        let bin = u64::from(self.bin_size);
        let mut buckets: BTreeMap<u64, (u64, i64)> = BTreeMap::new();

        let mut steps = sweep.steps().peekable();
        while let Some(step) = steps.next() {
            checkpoint.tick()?;
            let Some(next) = steps.peek() else {
                break;
            };
            if step.active == 0 {
                continue;
            }
            let units = self.model.units_for(step.active);
            let entry = buckets.entry(self.bucket_low(units)).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += next.time - step.time;
        }

        Ok(buckets
            .into_iter()
            .map(|(low, (count, seconds))| {
                let high = low + bin - 1;
                HistogramBucket {
                    range_label: format!("{low}-{high}"),
                    low,
                    high,
                    occurrence_count: count,
                    total_duration_seconds: seconds,
                }
            })
            .collect())
    }
}

/// Buckets ordered by their lower bound.
///
/// Fails with `InvalidParameter` when `bin_size` or `units_per_resource` is
/// zero. Empty input yields no buckets.
pub fn build_concurrency_histogram(
    intervals: &[Interval],
    bin_size: u32,
    units_per_resource: u32,
) -> Result<Vec<HistogramBucket>> {
    let model = ResourceModel::new(units_per_resource)?;
    HistogramAnalysis::new(bin_size, model)?.run(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::test_support::iv;

    #[test]
    fn test_rejects_zero_parameters() {
        let data = vec![iv("a", 0, 10)];
        assert_eq!(
            build_concurrency_histogram(&data, 0, 3).unwrap_err().code(),
            30
        );
        assert_eq!(
            build_concurrency_histogram(&data, 2, 0).unwrap_err().code(),
            30
        );
    }

    #[test]
    fn test_empty_input_has_no_buckets() {
        assert!(build_concurrency_histogram(&[], 2, 3).unwrap().is_empty());
    }

    #[test]
    fn test_single_session_one_gap() {
        let data = vec![iv("a", 0, 60)];
        let buckets = build_concurrency_histogram(&data, 2, 3).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].range_label, "1-2");
        assert_eq!(buckets[0].occurrence_count, 1);
        assert_eq!(buckets[0].total_duration_seconds, 60);
    }

    #[test]
    fn test_units_map_to_ranges() {
        // 7 sessions over [0, 100) -> 3 units -> range 3-4 with bin 2.
        let data: Vec<_> = (0..7).map(|i| iv(&format!("u{i}"), 0, 100)).collect();
        let buckets = build_concurrency_histogram(&data, 2, 3).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!((buckets[0].low, buckets[0].high), (3, 4));
        assert_eq!(buckets[0].total_duration_seconds, 100);
    }

    #[test]
    fn test_gaps_split_by_level() {
        // one unit per subject: levels 1 on [0,5), 2 on [5,10), 1 on [10,15)
        let data = vec![iv("a", 0, 10), iv("b", 5, 15)];
        let buckets = build_concurrency_histogram(&data, 1, 1).unwrap();
        let got: Vec<(&str, u64, i64)> = buckets
            .iter()
            .map(|b| {
                (
                    b.range_label.as_str(),
                    b.occurrence_count,
                    b.total_duration_seconds,
                )
            })
            .collect();
        assert_eq!(got, vec![("1-1", 2, 10), ("2-2", 1, 5)]);
    }

    #[test]
    fn test_idle_gaps_not_counted() {
        let data = vec![iv("a", 0, 10), iv("b", 50, 60)];
        let buckets = build_concurrency_histogram(&data, 2, 3).unwrap();
        let total: u64 = buckets.iter().map(|b| b.occurrence_count).sum();
        let seconds: i64 = buckets.iter().map(|b| b.total_duration_seconds).sum();
        assert_eq!(total, 2);
        assert_eq!(seconds, 20);
    }

    #[test]
    fn test_buckets_sorted_by_low() {
        let mut data: Vec<_> = (0..10).map(|i| iv(&format!("u{i}"), 0, 10)).collect();
        data.push(iv("late", 20, 30));
        let buckets = build_concurrency_histogram(&data, 1, 2).unwrap();
        let lows: Vec<u64> = buckets.iter().map(|b| b.low).collect();
        assert_eq!(lows, vec![1, 5]);
    }
}
