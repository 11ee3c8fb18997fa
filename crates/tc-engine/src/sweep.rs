//! Event sweep over session intervals.
//!
//! Each interval contributes a `+1` event at its start and a `-1` event at its
//! end. Events are sorted by time; coincident events put starts before ends
//! and then order by subject so the sequence is fully deterministic.
//!
//! Consumers never look at events one at a time. They walk [`Step`]s: all
//! events sharing a timestamp, applied as one atomic update. The net count
//! after a step is the concurrency sampled at that instant and the
//! concurrency that holds until the next step. This makes every analysis
//! independent of the input order and of how ties are interleaved.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::cancel::Checkpoint;
use tc_common::{Interval, Result, SubjectId};

/// Direction of a point event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delta {
    Start,
    End,
}

impl Delta {
    /// Signed contribution to the running count.
    pub fn value(self) -> i64 {
        match self {
            Delta::Start => 1,
            Delta::End => -1,
        }
    }

    /// Tie-break rank: starts sort before ends at the same instant.
    fn rank(self) -> u8 {
        match self {
            Delta::Start => 0,
            Delta::End => 1,
        }
    }
}

/// A signed point event borrowed from its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    /// Epoch seconds.
    pub time: i64,
    pub delta: Delta,
    pub subject: &'a SubjectId,
}

impl Event<'_> {
    pub fn instant(&self) -> DateTime<Utc> {
        to_instant(self.time)
    }
}

/// The sorted event sequence for one analysis pass.
#[derive(Debug, Clone)]
pub struct EventSweep<'a> {
    events: Vec<Event<'a>>,
}

impl<'a> EventSweep<'a> {
    /// Build the sorted sequence: exactly two events per interval.
    pub fn build(intervals: &'a [Interval]) -> Self {
        let mut events = Vec::with_capacity(intervals.len() * 2);
        for iv in intervals {
            events.push(Event {
                time: iv.start_secs(),
                delta: Delta::Start,
                subject: &iv.subject,
            });
            events.push(Event {
                time: iv.end_secs(),
                delta: Delta::End,
                subject: &iv.subject,
            });
        }
        events.sort_unstable_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then(a.delta.rank().cmp(&b.delta.rank()))
                .then_with(|| a.subject.cmp(b.subject))
        });
        EventSweep { events }
    }

    pub fn events(&self) -> &[Event<'a>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Walk the sequence one timestamp group at a time.
    pub fn steps(&self) -> Steps<'_, 'a> {
        Steps {
            events: &self.events,
            pos: 0,
            active: 0,
        }
    }
}

/// All events sharing one timestamp, with the count before and after them.
#[derive(Debug, Clone, Copy)]
pub struct Step<'s, 'a> {
    /// Epoch seconds.
    pub time: i64,
    pub events: &'s [Event<'a>],
    pub active_before: usize,
    pub active: usize,
}

impl<'s, 'a> Step<'s, 'a> {
    pub fn instant(&self) -> DateTime<Utc> {
        to_instant(self.time)
    }

    pub fn starts(&self) -> impl Iterator<Item = &'a SubjectId> + 's {
        let events: &'s [Event<'a>] = self.events;
        events
            .iter()
            .filter(|e| e.delta == Delta::Start)
            .map(|e| e.subject)
    }

    pub fn ends(&self) -> impl Iterator<Item = &'a SubjectId> + 's {
        let events: &'s [Event<'a>] = self.events;
        events
            .iter()
            .filter(|e| e.delta == Delta::End)
            .map(|e| e.subject)
    }
}

/// Iterator over [`Step`]s.
pub struct Steps<'s, 'a> {
    events: &'s [Event<'a>],
    pos: usize,
    active: usize,
}

impl<'s, 'a> Iterator for Steps<'s, 'a> {
    type Item = Step<'s, 'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.events.get(self.pos)?;
        let time = first.time;
        let len = self.events[self.pos..]
            .iter()
            .take_while(|e| e.time == time)
            .count();
        let group = &self.events[self.pos..self.pos + len];
        self.pos += len;

        let net: i64 = group.iter().map(|e| e.delta.value()).sum();
        let before = self.active;
        // Every end is preceded (or accompanied) by its start, so the count
        // cannot go negative.
        self.active = usize::try_from(before as i64 + net).unwrap_or(0);

        Some(Step {
            time,
            events: group,
            active_before: before,
            active: self.active,
        })
    }
}

/// Multiset of active subjects.
///
/// The same subject may hold overlapping sessions; it stays in the set until
/// its last session ends.
#[derive(Debug, Default, Clone)]
pub struct ActiveSet<'a> {
    counts: BTreeMap<&'a SubjectId, usize>,
}

impl<'a> ActiveSet<'a> {
    /// Apply a step: its starts, then its ends.
    pub fn apply(&mut self, step: &Step<'_, 'a>) {
        for subject in step.starts() {
            *self.counts.entry(subject).or_insert(0) += 1;
        }
        for subject in step.ends() {
            if let Some(n) = self.counts.get_mut(subject) {
                *n -= 1;
                if *n == 0 {
                    self.counts.remove(subject);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Owned, ordered copy of the distinct active subjects.
    pub fn snapshot(&self) -> BTreeSet<SubjectId> {
        self.counts.keys().map(|s| (*s).clone()).collect()
    }
}

/// An analysis that consumes one sweep.
///
/// Implementations tick the checkpoint once per step and must produce the
/// same output whether or not the checkpoint ever fires.
pub trait SweepAnalysis {
    type Output;

    fn analyze(&self, sweep: &EventSweep<'_>, checkpoint: &mut Checkpoint<'_>)
        -> Result<Self::Output>;

    /// Build the sweep and run to completion without cancellation.
    fn run(&self, intervals: &[Interval]) -> Result<Self::Output> {
        let sweep = EventSweep::build(intervals);
        self.analyze(&sweep, &mut Checkpoint::unbounded())
    }
}

pub(crate) fn to_instant(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn at(secs: i64) -> DateTime<Utc> {
        to_instant(secs)
    }

    pub fn iv(subject: &str, start: i64, end: i64) -> Interval {
        Interval::new(SubjectId::from(subject), at(start), at(end)).expect("valid interval")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::iv;
    use super::*;

    #[test]
    fn test_two_events_per_interval_sorted() {
        let data = vec![iv("b", 5, 15), iv("a", 0, 10)];
        let sweep = EventSweep::build(&data);
        let times: Vec<i64> = sweep.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_starts_before_ends_on_tie() {
        let data = vec![iv("a", 0, 10), iv("b", 10, 20)];
        let sweep = EventSweep::build(&data);
        let at_ten: Vec<Delta> = sweep
            .events()
            .iter()
            .filter(|e| e.time == 10)
            .map(|e| e.delta)
            .collect();
        assert_eq!(at_ten, vec![Delta::Start, Delta::End]);
    }

    #[test]
    fn test_steps_group_ties_atomically() {
        let data = vec![iv("a", 0, 10), iv("b", 10, 20)];
        let sweep = EventSweep::build(&data);
        let steps: Vec<(i64, usize, usize)> = sweep
            .steps()
            .map(|s| (s.time, s.active_before, s.active))
            .collect();
        assert_eq!(steps, vec![(0, 0, 1), (10, 1, 1), (20, 1, 0)]);
    }

    #[test]
    fn test_zero_length_interval_nets_out() {
        let data = vec![iv("a", 5, 5)];
        let sweep = EventSweep::build(&data);
        assert_eq!(sweep.events().len(), 2);
        let steps: Vec<Step> = sweep.steps().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].active, 0);
        assert_eq!(steps[0].starts().count(), 1);
        assert_eq!(steps[0].ends().count(), 1);
    }

    #[test]
    fn test_active_set_is_a_multiset() {
        let data = vec![iv("a", 0, 10), iv("a", 5, 15)];
        let sweep = EventSweep::build(&data);
        let mut set = ActiveSet::default();
        let mut sizes = Vec::new();
        for step in sweep.steps() {
            set.apply(&step);
            sizes.push(set.len());
        }
        // "a" stays active until its second session ends at 15.
        assert_eq!(sizes, vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_empty_sweep() {
        let data: Vec<Interval> = Vec::new();
        let sweep = EventSweep::build(&data);
        assert!(sweep.is_empty());
        assert_eq!(sweep.steps().count(), 0);
    }
}
