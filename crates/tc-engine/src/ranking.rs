//! Top-N entity rankings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::merge::EntityUsage;
use crate::normalize::NormalizedRecord;
use tc_common::EntityId;

/// Default number of entries in a ranking.
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub entity: EntityId,
    pub total_seconds: i64,
}

fn top(totals: impl IntoIterator<Item = (EntityId, i64)>, limit: usize) -> Vec<RankedEntity> {
    let mut ranked: Vec<RankedEntity> = totals
        .into_iter()
        .map(|(entity, total_seconds)| RankedEntity {
            entity,
            total_seconds,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    ranked.truncate(limit);
    ranked
}

/// Users by the sum of their source-reported durations.
///
/// Records without a reported duration are ignored. Overlapping sessions are
/// counted in full, so this can exceed wall-clock time; see
/// [`rank_by_active_time`] for the merged view. Totals saturate at `i64::MAX`.
pub fn rank_by_reported_duration(records: &[NormalizedRecord], limit: usize) -> Vec<RankedEntity> {
    let mut totals: BTreeMap<EntityId, i64> = BTreeMap::new();
    for record in records {
        if let Some(seconds) = record.reported_duration_seconds {
            let total = totals.entry(record.interval.user().clone()).or_insert(0);
            *total = total.saturating_add(seconds);
        }
    }
    top(totals, limit)
}

/// Entities by non-overlapping active time.
pub fn rank_by_active_time(
    usage: &BTreeMap<EntityId, EntityUsage>,
    limit: usize,
) -> Vec<RankedEntity> {
    top(
        usage
            .iter()
            .map(|(id, u)| (id.clone(), u.total_active_seconds)),
        limit,
    )
}
