//! Non-overlapping active time per entity.
//!
//! Overlapping intervals of the same entity are merged before their
//! durations are summed, so an entity with two sessions open at once is not
//! counted twice. Merging happens separately for the entity total and for
//! each tag value under the entity; overlap never collapses across groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tc_common::{EntityId, Interval, SubjectId, TagKind, TagValue};

/// Which dimension intervals are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// The session owner, see [`Interval::user`].
    User,
    Product,
    Server,
    /// The full (possibly composed) subject id.
    Subject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUsage {
    pub entity_id: EntityId,
    pub total_active_seconds: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_tag_seconds: BTreeMap<TagValue, i64>,
}

/// Total time covered by `intervals` with overlaps counted once.
///
/// Touching intervals (`next.start == cur.end`) merge into one span. The
/// total saturates at `i64::MAX`.
pub fn merged_duration_seconds<'a, I>(intervals: I) -> i64
where
    I: IntoIterator<Item = &'a Interval>,
{
    let mut spans: Vec<(i64, i64)> = intervals
        .into_iter()
        .map(|iv| (iv.start_secs(), iv.end_secs()))
        .collect();
    spans.sort_unstable();

    let mut total = 0i64;
    let mut current: Option<(i64, i64)> = None;
    for (start, end) in spans {
        current = match current {
            Some((cur_start, cur_end)) if start > cur_end => {
                total = total.saturating_add(cur_end - cur_start);
                Some((start, end))
            }
            Some((cur_start, cur_end)) => Some((cur_start, cur_end.max(end))),
            None => Some((start, end)),
        };
    }
    if let Some((cur_start, cur_end)) = current {
        total = total.saturating_add(cur_end - cur_start);
    }
    total
}

/// Group intervals by entity.
///
/// For `Product` and `Server`, intervals without that tag are left out.
pub fn group_by_entity(
    intervals: &[Interval],
    kind: EntityKind,
) -> BTreeMap<EntityId, Vec<Interval>> {
    let mut groups: BTreeMap<EntityId, Vec<Interval>> = BTreeMap::new();
    for iv in intervals {
        let key = match kind {
            EntityKind::User => iv.user().clone(),
            EntityKind::Subject => iv.subject.clone(),
            EntityKind::Product => match iv.tag(TagKind::Product) {
                Some(tag) => SubjectId::new(tag.0.as_str()),
                None => continue,
            },
            EntityKind::Server => match iv.tag(TagKind::Server) {
                Some(tag) => SubjectId::new(tag.0.as_str()),
                None => continue,
            },
        };
        groups.entry(key).or_default().push(iv.clone());
    }
    groups
}

/// Merged active time per entity, optionally split by `tag_kind`.
///
/// Intervals that lack the requested tag still count toward their entity's
/// total but toward no tag group.
pub fn aggregate_non_overlapping(
    intervals_by_entity: &BTreeMap<EntityId, Vec<Interval>>,
    tag_kind: Option<TagKind>,
) -> BTreeMap<EntityId, EntityUsage> {
    intervals_by_entity
        .iter()
        .map(|(entity, intervals)| {
            let mut per_tag_seconds = BTreeMap::new();
            if let Some(kind) = tag_kind {
                let mut by_tag: BTreeMap<&TagValue, Vec<&Interval>> = BTreeMap::new();
                for iv in intervals {
                    if let Some(tag) = iv.tag(kind) {
                        by_tag.entry(tag).or_default().push(iv);
                    }
                }
                for (tag, group) in by_tag {
                    per_tag_seconds.insert(tag.clone(), merged_duration_seconds(group));
                }
            }
            let usage = EntityUsage {
                entity_id: entity.clone(),
                total_active_seconds: merged_duration_seconds(intervals),
                per_tag_seconds,
            };
            (entity.clone(), usage)
        })
        .collect()
}
