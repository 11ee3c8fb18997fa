//! Worst-case and average concurrency.

use serde::{Deserialize, Serialize};

use crate::cancel::Checkpoint;
use crate::sweep::{EventSweep, SweepAnalysis};
use tc_common::{Interval, Result};

/// Headline concurrency figures for a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyStats {
    /// Highest simultaneous session count observed.
    pub worst_case: usize,
    /// Mean of the per-step samples, rounded half up.
    pub average_case: usize,
}

/// Samples the running count once per step.
///
/// The average is event-weighted: each timestamp where something started or
/// ended counts once, however long the level then persisted. The histogram
/// is the duration-weighted view of the same data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrencyStatsAnalysis;

impl SweepAnalysis for ConcurrencyStatsAnalysis {
    type Output = ConcurrencyStats;

    fn analyze(
        &self,
        sweep: &EventSweep<'_>,
        checkpoint: &mut Checkpoint<'_>,
    ) -> Result<ConcurrencyStats> {
        checkpoint.check()?;
        let mut worst = 0usize;
        let mut sum: u128 = 0;
        let mut samples: u128 = 0;

        for step in sweep.steps() {
            checkpoint.tick()?;
            worst = worst.max(step.active);
            sum += step.active as u128;
            samples += 1;
        }

        if samples == 0 {
            return Ok(ConcurrencyStats::default());
        }
        // round(sum / samples), halves rounding up
        let average = (2 * sum + samples) / (2 * samples);
        Ok(ConcurrencyStats {
            worst_case: worst,
            average_case: average as usize,
        })
    }
}

/// Worst and average concurrency over `intervals`. Empty input yields `{0, 0}`.
pub fn compute_concurrency_stats(intervals: &[Interval]) -> ConcurrencyStats {
    let sweep = EventSweep::build(intervals);
    ConcurrencyStatsAnalysis
        .analyze(&sweep, &mut Checkpoint::unbounded())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::test_support::iv;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_concurrency_stats(&[]), ConcurrencyStats::default());
    }

    #[test]
    fn test_two_overlapping() {
        // samples 1, 2, 1, 0 at t = 0, 5, 10, 15
        let data = vec![iv("a", 0, 10), iv("b", 5, 15)];
        let stats = compute_concurrency_stats(&data);
        assert_eq!(stats.worst_case, 2);
        assert_eq!(stats.average_case, 1);
    }

    #[test]
    fn test_event_weighted_not_time_weighted() {
        // One long session and a burst of three short ones. Time-weighted the
        // mean is close to 1; event-weighted it is pulled up by the burst.
        let data = vec![
            iv("long", 0, 10_000),
            iv("b1", 100, 101),
            iv("b2", 100, 101),
            iv("b3", 100, 101),
        ];
        // steps: t0 -> 1, t100 -> 4, t101 -> 1, t10000 -> 0
        let stats = compute_concurrency_stats(&data);
        assert_eq!(stats.worst_case, 4);
        // round(6 / 4) = round(1.5) = 2
        assert_eq!(stats.average_case, 2);
    }

    #[test]
    fn test_zero_length_does_not_raise_worst_case() {
        let data = vec![iv("a", 0, 10), iv("b", 5, 5)];
        let stats = compute_concurrency_stats(&data);
        assert_eq!(stats.worst_case, 1);
    }

    #[test]
    fn test_back_to_back_sessions_do_not_overlap() {
        let data = vec![iv("a", 0, 10), iv("b", 10, 20)];
        let stats = compute_concurrency_stats(&data);
        assert_eq!(stats.worst_case, 1);
        // samples 1, 1, 0
        assert_eq!(stats.average_case, 1);
    }

    #[test]
    fn test_cancelled_pass_reports_error() {
        use crate::cancel::CancellationToken;
        let data: Vec<_> = (0..50).map(|i| iv("s", i * 10, i * 10 + 5)).collect();
        let sweep = EventSweep::build(&data);
        let token = CancellationToken::new();
        token.cancel();
        let mut cp = Checkpoint::new(&token, 8);
        assert!(ConcurrencyStatsAnalysis.analyze(&sweep, &mut cp).is_err());
    }
}
