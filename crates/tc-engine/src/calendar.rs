//! Calendar views over session start times: date filtering, month lists,
//! daily volume and hour-of-day heatmaps. All dates are UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use tc_common::{Error, Interval, Result};

/// A calendar month, `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_parameter("month", month, "must be 1-12"));
        }
        Ok(YearMonth { year, month })
    }

    pub fn of(instant: &DateTime<Utc>) -> Self {
        YearMonth {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// First and last day of the month.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| Error::invalid_parameter("month", self, "out of range"))?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| Error::invalid_parameter("month", self, "out of range"))?;
        Ok((first, last))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::invalid_parameter("month", s, "expected YYYY-MM");
        let (year, month) = s.trim().split_once('-').ok_or_else(bad)?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        YearMonth::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> String {
        ym.to_string()
    }
}

/// First and last day of `month`.
pub fn month_bounds(month: YearMonth) -> Result<(NaiveDate, NaiveDate)> {
    month.bounds()
}

/// Whether the UTC date of `instant` lies in `[from, to]`.
pub fn within_dates(
    instant: &DateTime<Utc>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> bool {
    let day = instant.date_naive();
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

/// Keep intervals whose start date lies in `[from, to]`. Either bound may be
/// open.
pub fn filter_by_date(
    intervals: &[Interval],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<Interval> {
    intervals
        .iter()
        .filter(|iv| within_dates(&iv.start, from, to))
        .cloned()
        .collect()
}

/// Distinct months that contain at least one session start, oldest first.
pub fn available_months(intervals: &[Interval]) -> Vec<YearMonth> {
    intervals
        .iter()
        .map(|iv| YearMonth::of(&iv.start))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub sessions: u64,
}

/// Sessions started per day, chronological. Days without sessions are omitted.
pub fn daily_volume(intervals: &[Interval]) -> Vec<DailyVolume> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for iv in intervals {
        *days.entry(iv.start.date_naive()).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(date, sessions)| DailyVolume { date, sessions })
        .collect()
}

/// Row dimension of a login heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapGrouping {
    Weekday,
    DayOfMonth,
    Month,
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Logins per hour of day for one row of the heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub label: String,
    pub hours: [u32; 24],
}

impl HeatmapRow {
    pub fn total(&self) -> u64 {
        self.hours.iter().map(|&h| u64::from(h)).sum()
    }
}

/// Count session starts by (row, hour). Rows follow calendar order and only
/// rows with at least one login are returned.
pub fn login_heatmap(intervals: &[Interval], grouping: HeatmapGrouping) -> Vec<HeatmapRow> {
    let mut rows: BTreeMap<u32, [u32; 24]> = BTreeMap::new();
    for iv in intervals {
        let key = match grouping {
            HeatmapGrouping::Weekday => iv.start.weekday().num_days_from_monday(),
            HeatmapGrouping::DayOfMonth => iv.start.day(),
            HeatmapGrouping::Month => iv.start.month0(),
        };
        let hour = iv.start.hour() as usize;
        rows.entry(key).or_insert([0; 24])[hour] += 1;
    }
    rows.into_iter()
        .map(|(key, hours)| HeatmapRow {
            label: row_label(grouping, key),
            hours,
        })
        .collect()
}

fn row_label(grouping: HeatmapGrouping, key: u32) -> String {
    match grouping {
        HeatmapGrouping::Weekday => WEEKDAYS[key as usize % 7].to_string(),
        HeatmapGrouping::DayOfMonth => key.to_string(),
        HeatmapGrouping::Month => MONTHS[key as usize % 12].to_string(),
    }
}
