//! Command payloads and their human renderings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::markdown::{format_duration, table};
use tc_common::TagKind;
use tc_engine::{
    ConcurrencyStats, DailyVolume, EntityKind, EntityUsage, HeatmapGrouping, HeatmapRow,
    HistogramBucket, PeakOccurrence, PeakPeriod, RankedEntity, TokenRecommendation, YearMonth,
};

/// A payload that can also be shown to a person.
pub trait Render {
    fn to_markdown(&self) -> String;
    fn summary_line(&self) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: ConcurrencyStats,
    pub units_per_resource: u32,
    /// Tokens the worst case needs.
    pub peak_tokens: u64,
    pub average_tokens: u64,
    pub recommendation: TokenRecommendation,
}

impl Render for StatsReport {
    fn to_markdown(&self) -> String {
        let r = &self.recommendation;
        let mut md = String::from("# Concurrency\n\n");
        md.push_str(&table(
            &["Measure", "Sessions", "Tokens"],
            &[
                vec![
                    "Worst case".into(),
                    self.stats.worst_case.to_string(),
                    self.peak_tokens.to_string(),
                ],
                vec![
                    "Average".into(),
                    self.stats.average_case.to_string(),
                    self.average_tokens.to_string(),
                ],
            ],
        ));
        md.push_str(&format!(
            "\nPeak uses {:.1}% of {} concurrent sessions ({} users per token). {}\n",
            r.usage_pct,
            r.capacity,
            self.units_per_resource,
            r.verdict.message()
        ));
        md
    }

    fn summary_line(&self) -> String {
        format!(
            "worst {} (tokens {}), average {} (tokens {}), usage {:.1}%",
            self.stats.worst_case,
            self.peak_tokens,
            self.stats.average_case,
            self.average_tokens,
            self.recommendation.usage_pct
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    pub bin_size: u32,
    pub units_per_resource: u32,
    pub buckets: Vec<HistogramBucket>,
}

impl Render for HistogramReport {
    fn to_markdown(&self) -> String {
        let mut md = format!(
            "# Token Usage Histogram\n\nBins of {} tokens, {} users per token.\n\n",
            self.bin_size, self.units_per_resource
        );
        if self.buckets.is_empty() {
            md.push_str("No concurrent usage.\n");
            return md;
        }
        let rows: Vec<Vec<String>> = self
            .buckets
            .iter()
            .map(|b| {
                vec![
                    b.range_label.clone(),
                    b.occurrence_count.to_string(),
                    format_duration(b.total_duration_seconds),
                ]
            })
            .collect();
        md.push_str(&table(&["Tokens", "Occurrences", "Duration"], &rows));
        md
    }

    fn summary_line(&self) -> String {
        let busiest = self
            .buckets
            .iter()
            .max_by_key(|b| (b.total_duration_seconds, std::cmp::Reverse(b.low)));
        match busiest {
            Some(b) => format!(
                "{} buckets; most time at {} tokens ({})",
                self.buckets.len(),
                b.range_label,
                format_duration(b.total_duration_seconds)
            ),
            None => "0 buckets".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodsReport {
    pub threshold: i64,
    pub units_per_resource: u32,
    pub total_seconds: i64,
    pub periods: Vec<PeakPeriod>,
}

fn subjects_cell<'a>(subjects: impl ExactSizeIterator<Item = &'a tc_common::SubjectId>) -> String {
    const SHOWN: usize = 5;
    let count = subjects.len();
    let mut names: Vec<&str> = subjects.take(SHOWN).map(|s| s.as_str()).collect();
    if count > SHOWN {
        names.push("…");
    }
    names.join(", ")
}

fn instant(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Render for PeriodsReport {
    fn to_markdown(&self) -> String {
        let mut md = format!(
            "# Peak Periods\n\nAt or above {} tokens ({} users per token).\n\n",
            self.threshold, self.units_per_resource
        );
        if self.periods.is_empty() {
            md.push_str("No periods reached the threshold.\n");
            return md;
        }
        let rows: Vec<Vec<String>> = self
            .periods
            .iter()
            .map(|p| {
                vec![
                    instant(&p.start),
                    instant(&p.end),
                    format_duration(p.duration_seconds),
                    p.resource_units_used.to_string(),
                    p.raw_concurrency.to_string(),
                    subjects_cell(p.active_subjects.iter()),
                ]
            })
            .collect();
        md.push_str(&table(
            &["Start", "End", "Duration", "Tokens", "Sessions", "Active"],
            &rows,
        ));
        md
    }

    fn summary_line(&self) -> String {
        format!(
            "{} periods at >= {} tokens, {} in total",
            self.periods.len(),
            self.threshold,
            format_duration(self.total_seconds)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OccurrencesReport {
    pub threshold: u64,
    pub units_per_resource: u32,
    pub occurrences: Vec<PeakOccurrence>,
}

impl Render for OccurrencesReport {
    fn to_markdown(&self) -> String {
        let mut md = format!(
            "# Occurrences of {} Tokens\n\n{} users per token.\n\n",
            self.threshold, self.units_per_resource
        );
        if self.occurrences.is_empty() {
            md.push_str("Usage never reached exactly this level.\n");
            return md;
        }
        let rows: Vec<Vec<String>> = self
            .occurrences
            .iter()
            .map(|o| {
                vec![
                    instant(&o.time),
                    o.raw_concurrency.to_string(),
                    subjects_cell(o.active_subjects.iter()),
                ]
            })
            .collect();
        md.push_str(&table(&["Time", "Sessions", "Active"], &rows));
        md
    }

    fn summary_line(&self) -> String {
        format!(
            "{} occurrences of exactly {} tokens",
            self.occurrences.len(),
            self.threshold
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub by: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagKind>,
    pub limit: usize,
    /// Merged active time, in ranking order.
    pub by_active_time: Vec<EntityUsage>,
    /// Sum of source-reported durations per user.
    pub by_reported_duration: Vec<RankedEntity>,
}

impl Render for UsageReport {
    fn to_markdown(&self) -> String {
        let mut md = String::from("# Usage\n\n## Active time (overlaps merged)\n\n");
        let rows: Vec<Vec<String>> = self
            .by_active_time
            .iter()
            .map(|u| {
                let tags = u
                    .per_tag_seconds
                    .iter()
                    .map(|(tag, secs)| format!("{}: {}", tag, format_duration(*secs)))
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    u.entity_id.to_string(),
                    format_duration(u.total_active_seconds),
                    tags,
                ]
            })
            .collect();
        md.push_str(&table(&["Entity", "Active", "By tag"], &rows));

        if !self.by_reported_duration.is_empty() {
            md.push_str("\n## Reported duration\n\n");
            let rows: Vec<Vec<String>> = self
                .by_reported_duration
                .iter()
                .map(|r| vec![r.entity.to_string(), format_duration(r.total_seconds)])
                .collect();
            md.push_str(&table(&["User", "Duration"], &rows));
        }
        md
    }

    fn summary_line(&self) -> String {
        match self.by_active_time.first() {
            Some(top) => format!(
                "top {} by active time: {} ({})",
                self.by_active_time.len(),
                top.entity_id,
                format_duration(top.total_active_seconds)
            ),
            None => "no usage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarReport {
    pub months: Vec<YearMonth>,
    pub daily_volume: Vec<DailyVolume>,
    pub heatmap_grouping: HeatmapGrouping,
    pub heatmap: Vec<HeatmapRow>,
}

impl Render for CalendarReport {
    fn to_markdown(&self) -> String {
        let months: Vec<String> = self.months.iter().map(|m| m.to_string()).collect();
        let mut md = format!(
            "# Calendar\n\nMonths with sessions: {}\n\n## Daily volume\n\n",
            if months.is_empty() {
                "none".to_string()
            } else {
                months.join(", ")
            }
        );
        let rows: Vec<Vec<String>> = self
            .daily_volume
            .iter()
            .map(|d| vec![d.date.to_string(), d.sessions.to_string()])
            .collect();
        md.push_str(&table(&["Date", "Sessions"], &rows));

        md.push_str("\n## Logins by hour\n\n");
        let mut headers: Vec<String> = vec!["".to_string()];
        headers.extend((0..24).map(|h| format!("{h:02}")));
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let rows: Vec<Vec<String>> = self
            .heatmap
            .iter()
            .map(|row| {
                let mut cells = vec![row.label.clone()];
                cells.extend(row.hours.iter().map(|h| h.to_string()));
                cells
            })
            .collect();
        md.push_str(&table(&header_refs, &rows));
        md
    }

    fn summary_line(&self) -> String {
        let sessions: u64 = self.daily_volume.iter().map(|d| d.sessions).sum();
        format!(
            "{} sessions over {} days in {} months",
            sessions,
            self.daily_volume.len(),
            self.months.len()
        )
    }
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    pub stats: StatsReport,
    pub histogram: HistogramReport,
    pub periods: PeriodsReport,
    pub usage: UsageReport,
    pub calendar: CalendarReport,
}

impl Render for FullReport {
    fn to_markdown(&self) -> String {
        [
            self.stats.to_markdown(),
            self.histogram.to_markdown(),
            self.periods.to_markdown(),
            self.usage.to_markdown(),
            self.calendar.to_markdown(),
        ]
        .join("\n")
    }

    fn summary_line(&self) -> String {
        format!(
            "{}; {}",
            self.stats.summary_line(),
            self.periods.summary_line()
        )
    }
}
