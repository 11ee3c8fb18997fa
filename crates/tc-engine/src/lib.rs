//! Token concurrency engine.
//!
//! Pure, synchronous analyses over immutable interval snapshots:
//! - Interval normalization from raw source records
//! - The event sweep shared by every concurrency analysis
//! - Worst/average concurrency, the duration-weighted histogram,
//!   threshold periods and threshold occurrences
//! - Per-entity non-overlapping active time
//! - Calendar, ranking and capacity helpers built on the same intervals
//!
//! Every analysis can run under a [`Checkpoint`] so a caller with a deadline
//! can cancel between slices of the sweep without changing the result of an
//! uninterrupted pass.

pub mod calendar;
pub mod cancel;
pub mod capacity;
pub mod histogram;
pub mod merge;
pub mod normalize;
pub mod occurrences;
pub mod periods;
pub mod ranking;
pub mod resource;
pub mod stats;
pub mod sweep;

pub use calendar::{
    available_months, daily_volume, filter_by_date, login_heatmap, month_bounds, within_dates,
    DailyVolume, HeatmapGrouping, HeatmapRow, YearMonth,
};
pub use cancel::{CancellationToken, Checkpoint};
pub use capacity::{CapacityPolicy, TokenRecommendation, Verdict};
pub use histogram::{build_concurrency_histogram, HistogramAnalysis, HistogramBucket};
pub use merge::{
    aggregate_non_overlapping, group_by_entity, merged_duration_seconds, EntityKind, EntityUsage,
};
pub use normalize::{parse_instant, NormalizeReport, NormalizedRecord, Normalizer, SkippedRecord};
pub use occurrences::{extract_peak_occurrences, PeakOccurrence, PeakOccurrenceAnalysis};
pub use periods::{extract_peak_periods, PeakPeriod, PeakPeriodAnalysis};
pub use ranking::{rank_by_active_time, rank_by_reported_duration, RankedEntity};
pub use resource::ResourceModel;
pub use stats::{compute_concurrency_stats, ConcurrencyStats, ConcurrencyStatsAnalysis};
pub use sweep::{ActiveSet, Delta, Event, EventSweep, Step, SweepAnalysis};
