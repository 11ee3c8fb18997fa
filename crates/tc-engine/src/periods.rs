//! Maximal windows where resource-unit usage stays at or above a threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::cancel::Checkpoint;
use crate::resource::ResourceModel;
use crate::sweep::{to_instant, ActiveSet, EventSweep, SweepAnalysis};
use tc_common::{Interval, Result, SubjectId};

/// A half-open window `[start, end)` at or above the threshold.
///
/// Subjects, units and raw concurrency describe the last qualifying level
/// before usage dropped below the threshold (or before the data ended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub active_subjects: BTreeSet<SubjectId>,
    pub resource_units_used: u64,
    pub raw_concurrency: usize,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct PeakPeriodAnalysis {
    threshold: i64,
    model: ResourceModel,
}

impl PeakPeriodAnalysis {
    pub fn new(threshold: i64, model: ResourceModel) -> Self {
        PeakPeriodAnalysis { threshold, model }
    }

    fn meets(&self, units: u64) -> bool {
        i64::try_from(units).map_or(true, |u| u >= self.threshold)
    }

    fn close(&self, start: i64, end: i64, set: &ActiveSet<'_>, raw: usize) -> PeakPeriod {
        PeakPeriod {
            start: to_instant(start),
            end: to_instant(end),
            active_subjects: set.snapshot(),
            resource_units_used: self.model.units_for(raw),
            raw_concurrency: raw,
            duration_seconds: end - start,
        }
    }
}

impl SweepAnalysis for PeakPeriodAnalysis {
    type Output = Vec<PeakPeriod>;

    fn analyze(
        &self,
        sweep: &EventSweep<'_>,
        checkpoint: &mut Checkpoint<'_>,
    ) -> Result<Vec<PeakPeriod>> {
        checkpoint.check()?;
        let mut periods = Vec::new();
        let mut set = ActiveSet::default();
        let mut open: Option<i64> = None;

        let mut steps = sweep.steps().peekable();
        while let Some(step) = steps.next() {
            checkpoint.tick()?;
            let is_last = steps.peek().is_none();
            let met = self.meets(self.model.units_for(step.active));

            match open {
                Some(start) if !met || is_last => {
                    // `set` still holds the level of the final segment.
                    periods.push(self.close(start, step.time, &set, step.active_before));
                    open = None;
                    set.apply(&step);
                }
                Some(_) => set.apply(&step),
                None => {
                    set.apply(&step);
                    if met {
                        if is_last {
                            periods.push(self.close(step.time, step.time, &set, step.active));
                        } else {
                            open = Some(step.time);
                        }
                    }
                }
            }
        }

        tracing::trace!(periods = periods.len(), threshold = self.threshold, "peak periods extracted");
        Ok(periods)
    }
}

/// Periods in chronological order. A threshold of zero or less yields a
/// single period spanning the whole dataset.
pub fn extract_peak_periods(
    intervals: &[Interval],
    threshold: i64,
    units_per_resource: u32,
) -> Result<Vec<PeakPeriod>> {
    let model = ResourceModel::new(units_per_resource)?;
    PeakPeriodAnalysis::new(threshold, model).run(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::test_support::{at, iv};

    fn names(p: &PeakPeriod) -> Vec<&str> {
        p.active_subjects.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_zero_threshold_single_covering_period() {
        let data = vec![iv("a", 0, 10), iv("b", 20, 30)];
        let periods = extract_peak_periods(&data, 0, 3).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start, at(0));
        assert_eq!(periods[0].end, at(30));
        assert_eq!(periods[0].duration_seconds, 30);
    }

    #[test]
    fn test_window_closes_when_usage_drops() {
        // one unit per subject, threshold 2: overlap [5, 10)
        let data = vec![iv("a", 0, 10), iv("b", 5, 15)];
        let periods = extract_peak_periods(&data, 2, 1).unwrap();
        assert_eq!(periods.len(), 1);
        let p = &periods[0];
        assert_eq!((p.start, p.end), (at(5), at(10)));
        assert_eq!(p.raw_concurrency, 2);
        assert_eq!(p.resource_units_used, 2);
        assert_eq!(names(p), vec!["a", "b"]);
    }

    #[test]
    fn test_final_segment_state_is_recorded() {
        // Level 3 on [5, 8), then 2 on [8, 12), then below threshold.
        let data = vec![iv("a", 0, 12), iv("b", 5, 12), iv("c", 5, 8)];
        let periods = extract_peak_periods(&data, 2, 1).unwrap();
        assert_eq!(periods.len(), 1);
        let p = &periods[0];
        assert_eq!((p.start, p.end), (at(5), at(12)));
        assert_eq!(p.raw_concurrency, 2);
        assert_eq!(names(p), vec!["a", "b"]);
    }

    #[test]
    fn test_two_separate_windows() {
        let data = vec![
            iv("a", 0, 10),
            iv("b", 0, 10),
            iv("c", 20, 30),
            iv("d", 25, 30),
        ];
        let periods = extract_peak_periods(&data, 2, 1).unwrap();
        let spans: Vec<_> = periods.iter().map(|p| (p.start, p.end)).collect();
        assert_eq!(spans, vec![(at(0), at(10)), (at(25), at(30))]);
    }

    #[test]
    fn test_unreachable_threshold_is_empty() {
        let data = vec![iv("a", 0, 10), iv("b", 5, 15)];
        assert!(extract_peak_periods(&data, 5, 3).unwrap().is_empty());
    }

    #[test]
    fn test_back_to_back_handover_does_not_split() {
        // b starts exactly when a ends: the level never dips.
        let data = vec![iv("a", 0, 10), iv("b", 10, 20)];
        let periods = extract_peak_periods(&data, 1, 1).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!((periods[0].start, periods[0].end), (at(0), at(20)));
        assert_eq!(names(&periods[0]), vec!["b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_peak_periods(&[], 0, 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_units_rejected() {
        assert!(extract_peak_periods(&[iv("a", 0, 1)], 1, 0).is_err());
    }
}
