//! Instants where resource-unit usage newly equals an exact value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::cancel::Checkpoint;
use crate::resource::ResourceModel;
use crate::sweep::{ActiveSet, EventSweep, SweepAnalysis};
use tc_common::{Interval, Result, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakOccurrence {
    pub time: DateTime<Utc>,
    pub resource_units_used: u64,
    pub raw_concurrency: usize,
    pub active_subjects: BTreeSet<SubjectId>,
}

/// Emits an occurrence whenever usage changes to exactly `threshold`.
///
/// Usage starts at zero. Reaching the value from below or from above both
/// count; staying at it across steps does not.
#[derive(Debug, Clone, Copy)]
pub struct PeakOccurrenceAnalysis {
    threshold: u64,
    model: ResourceModel,
}

impl PeakOccurrenceAnalysis {
    pub fn new(threshold: u64, model: ResourceModel) -> Self {
        PeakOccurrenceAnalysis { threshold, model }
    }
}

impl SweepAnalysis for PeakOccurrenceAnalysis {
    type Output = Vec<PeakOccurrence>;

    fn analyze(
        &self,
        sweep: &EventSweep<'_>,
        checkpoint: &mut Checkpoint<'_>,
    ) -> Result<Vec<PeakOccurrence>> {
        checkpoint.check()?;
        let mut found = Vec::new();
        let mut set = ActiveSet::default();
        let mut prev_units = 0u64;

        for step in sweep.steps() {
            checkpoint.tick()?;
            set.apply(&step);
            let units = self.model.units_for(step.active);
            if units != prev_units && units == self.threshold {
                found.push(PeakOccurrence {
                    time: step.instant(),
                    resource_units_used: units,
                    raw_concurrency: step.active,
                    active_subjects: set.snapshot(),
                });
            }
            prev_units = units;
        }
        Ok(found)
    }
}

/// Occurrences in chronological order.
pub fn extract_peak_occurrences(
    intervals: &[Interval],
    threshold: u64,
    units_per_resource: u32,
) -> Result<Vec<PeakOccurrence>> {
    let model = ResourceModel::new(units_per_resource)?;
    PeakOccurrenceAnalysis::new(threshold, model).run(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::test_support::{at, iv};

    #[test]
    fn test_rising_level_fires_once() {
        // 1 -> 2 -> 3 -> 0 with one unit per subject
        let data = vec![iv("a", 0, 30), iv("b", 10, 30), iv("c", 20, 30)];
        let found = extract_peak_occurrences(&data, 3, 1).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].time, at(20));
        assert_eq!(found[0].raw_concurrency, 3);
        assert_eq!(found[0].active_subjects.len(), 3);
    }

    #[test]
    fn test_falling_back_to_value_fires_again() {
        // 1 -> 2 -> 3 -> 2 -> 0
        let data = vec![iv("a", 0, 40), iv("b", 10, 40), iv("c", 20, 30)];
        let found = extract_peak_occurrences(&data, 2, 1).unwrap();
        let times: Vec<_> = found.iter().map(|o| o.time).collect();
        assert_eq!(times, vec![at(10), at(30)]);
        let subjects: Vec<&str> = found[1]
            .active_subjects
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(subjects, vec!["a", "b"]);
    }

    #[test]
    fn test_level_change_within_same_unit_is_silent() {
        // three subjects per unit: 1, 2 and 3 sessions are all one unit
        let data = vec![iv("a", 0, 30), iv("b", 10, 30), iv("c", 20, 30)];
        let found = extract_peak_occurrences(&data, 1, 3).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].time, at(0));
    }

    #[test]
    fn test_multi_unit_level_reached_once_and_skipped_on_drop() {
        // 3 -> 6 -> 7 -> 0 sessions at three per unit: units 1 -> 2 -> 3 -> 0
        let mut data: Vec<Interval> = ["a", "b", "c"].iter().map(|s| iv(s, 0, 30)).collect();
        data.extend(["d", "e", "f"].iter().map(|s| iv(s, 10, 30)));
        data.push(iv("g", 20, 30));
        let found = extract_peak_occurrences(&data, 2, 3).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].time, at(10));
        assert_eq!(found[0].resource_units_used, 2);
        assert_eq!(found[0].raw_concurrency, 6);
        assert_eq!(found[0].active_subjects.len(), 6);
    }

    #[test]
    fn test_zero_threshold_fires_on_return_to_idle() {
        let data = vec![iv("a", 0, 10)];
        // usage goes 0 -> 1 -> 0; returning to zero is a change to the value
        let found = extract_peak_occurrences(&data, 0, 1).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].time, at(10));
        assert!(found[0].active_subjects.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_peak_occurrences(&[], 1, 3).unwrap().is_empty());
    }
}
