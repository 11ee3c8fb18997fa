//! Raw record → canonical [`Interval`].
//!
//! Column candidates are resolved once per record, in schema order. The first
//! non-blank candidate for a field is the one parsed; if it does not parse the
//! record is rejected rather than silently falling through to the next
//! candidate.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use tc_common::{
    FieldCandidate, Interval, InvalidRecord, RawRecord, SourceSchema, SubjectId, TagKind,
    TimeEncoding,
};

/// Naive layouts accepted for absolute timestamps, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A normalized interval plus the source's own duration figure, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub interval: Interval,
    /// The `DURATION` cell as reported by the source. Only rankings use it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub row: usize,
    pub reason: InvalidRecord,
}

/// Result of normalizing a whole source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub records: Vec<NormalizedRecord>,
    pub skipped: Vec<SkippedRecord>,
    /// Records seen, accepted or not.
    pub total: usize,
}

impl NormalizeReport {
    /// The accepted intervals, cloned out of their records.
    pub fn intervals(&self) -> Vec<Interval> {
        self.records.iter().map(|r| r.interval.clone()).collect()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Converts raw records using one [`SourceSchema`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    schema: SourceSchema,
}

impl Normalizer {
    pub fn new(schema: SourceSchema) -> Self {
        Normalizer { schema }
    }

    pub fn schema(&self) -> &SourceSchema {
        &self.schema
    }

    pub fn normalize(&self, record: &RawRecord) -> Result<NormalizedRecord, InvalidRecord> {
        let user = record
            .first_of(&self.schema.user)
            .ok_or(InvalidRecord::MissingSubject)?;
        let start = resolve_time(record, &self.schema.start, "start")?;
        let end = resolve_time(record, &self.schema.end, "end")?;

        let product = record.first_of(&self.schema.product);
        let server = record.first_of(&self.schema.server);
        let mut interval = if self.schema.compose_session_subject {
            Interval::new(SubjectId::session(user, product, server), start, end)?.with_user(user)
        } else {
            Interval::new(SubjectId::new(user), start, end)?
        };
        if let Some(p) = product {
            interval = interval.with_tag(TagKind::Product, p);
        }
        if let Some(s) = server {
            interval = interval.with_tag(TagKind::Server, s);
        }

        let reported_duration_seconds = record
            .first_of(&self.schema.duration)
            .and_then(parse_duration);

        Ok(NormalizedRecord {
            interval,
            reported_duration_seconds,
        })
    }

    /// Normalize every record, keeping the rejects with their row numbers.
    pub fn normalize_all<'r, I>(&self, records: I) -> NormalizeReport
    where
        I: IntoIterator<Item = &'r RawRecord>,
    {
        let mut report = NormalizeReport::default();
        for record in records {
            report.total += 1;
            match self.normalize(record) {
                Ok(normalized) => report.records.push(normalized),
                Err(reason) => {
                    tracing::debug!(row = record.row, %reason, "record rejected");
                    report.skipped.push(SkippedRecord {
                        row: record.row,
                        reason,
                    });
                }
            }
        }
        if !report.skipped.is_empty() {
            tracing::info!(
                skipped = report.skipped.len(),
                total = report.total,
                "records skipped during normalization"
            );
        }
        report
    }
}

fn resolve_time(
    record: &RawRecord,
    candidates: &[FieldCandidate],
    field: &str,
) -> Result<DateTime<Utc>, InvalidRecord> {
    let (value, encoding) = candidates
        .iter()
        .find_map(|c| record.get(&c.column).map(|v| (v, c.encoding)))
        .ok_or_else(|| InvalidRecord::MissingTime {
            field: field.to_string(),
        })?;
    parse_instant(value, encoding).ok_or_else(|| InvalidRecord::UnparseableTime {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parse one time cell. Sub-second precision is dropped.
pub fn parse_instant(value: &str, encoding: TimeEncoding) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = match encoding {
        TimeEncoding::Absolute => parse_absolute(value)?,
        TimeEncoding::EpochSeconds => {
            let secs = parse_whole_number(value)?;
            DateTime::<Utc>::from_timestamp(secs, 0)?
        }
    };
    DateTime::<Utc>::from_timestamp(parsed.timestamp(), 0)
}

fn parse_absolute(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

/// Integer, or a finite decimal truncated toward zero.
fn parse_whole_number(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok().filter(|f| f.is_finite())?;
    let truncated = f.trunc();
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}

fn parse_duration(value: &str) -> Option<i64> {
    parse_whole_number(value).filter(|d| *d >= 0)
}
