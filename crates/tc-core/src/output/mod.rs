//! Output rendering for CLI payloads.
//!
//! stdout carries exactly one payload per invocation. JSON payloads share an
//! envelope so agents can correlate them with logs and cached results.

pub mod markdown;
pub mod reports;

pub use reports::{
    CalendarReport, FullReport, HistogramReport, OccurrencesReport, PeriodsReport, Render,
    StatsReport, UsageReport,
};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use tc_common::{AnalysisId, OutputFormat, SCHEMA_VERSION};

/// What the payload was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub path: String,
    pub format: String,
    /// Records read from the source.
    pub records: usize,
    /// Records the normalizer rejected.
    pub skipped: usize,
    /// Intervals left after date filtering.
    pub intervals: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    /// SHA-256 of the canonical interval list.
    pub fingerprint: String,
}

/// Common JSON envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub analysis_id: &'a AnalysisId,
    pub generated_at: String,
    pub command: &'static str,
    pub input: &'a InputSummary,
    pub config_hash: &'a str,
    pub result: &'a T,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn new(
        command: &'static str,
        analysis_id: &'a AnalysisId,
        input: &'a InputSummary,
        config_hash: &'a str,
        result: &'a T,
    ) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            analysis_id,
            generated_at: Utc::now().to_rfc3339(),
            command,
            input,
            config_hash,
            result,
        }
    }
}

/// Render `envelope` in `format`. `None` for `exitcode`.
pub fn render<T: Serialize + Render>(
    format: OutputFormat,
    envelope: &Envelope<'_, T>,
) -> Result<Option<String>, serde_json::Error> {
    Ok(match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(envelope)?),
        OutputFormat::Md => {
            let mut md = envelope.result.to_markdown();
            if envelope.input.skipped > 0 {
                md.push_str(&format!(
                    "\n_{} of {} records skipped._\n",
                    envelope.input.skipped, envelope.input.records
                ));
            }
            Some(md)
        }
        OutputFormat::Summary => Some(format!(
            "[{}] {}: {}",
            envelope.analysis_id,
            envelope.command,
            envelope.result.summary_line()
        )),
        OutputFormat::Exitcode => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_engine::HistogramBucket;

    fn input() -> InputSummary {
        InputSummary {
            path: "sessions.csv".into(),
            format: "csv".into(),
            records: 10,
            skipped: 2,
            intervals: 8,
            from: None,
            to: None,
            fingerprint: "ab".repeat(32),
        }
    }

    fn histogram() -> HistogramReport {
        HistogramReport {
            bin_size: 2,
            units_per_resource: 3,
            buckets: vec![HistogramBucket {
                range_label: "1-2".into(),
                low: 1,
                high: 2,
                occurrence_count: 3,
                total_duration_seconds: 90,
            }],
        }
    }

    #[test]
    fn test_json_envelope_fields() {
        let id = AnalysisId::new();
        let input = input();
        let report = histogram();
        let envelope = Envelope::new("histogram", &id, &input, "cfg", &report);
        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, &envelope).unwrap().unwrap())
                .unwrap();
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert_eq!(json["analysis_id"], id.to_string());
        assert_eq!(json["input"]["records"], 10);
        assert_eq!(json["input"]["skipped"], 2);
        assert!(json["input"].get("from").is_none());
        assert_eq!(json["result"]["buckets"][0]["range_label"], "1-2");
    }

    #[test]
    fn test_markdown_notes_skipped() {
        let id = AnalysisId::new();
        let input = input();
        let report = histogram();
        let envelope = Envelope::new("histogram", &id, &input, "cfg", &report);
        let md = render(OutputFormat::Md, &envelope).unwrap().unwrap();
        assert!(md.contains("| 1-2 | 3 | 1m 30s |"));
        assert!(md.contains("2 of 10 records skipped"));
    }

    #[test]
    fn test_summary_and_exitcode() {
        let id = AnalysisId::new();
        let input = input();
        let report = histogram();
        let envelope = Envelope::new("histogram", &id, &input, "cfg", &report);
        let line = render(OutputFormat::Summary, &envelope).unwrap().unwrap();
        assert!(line.starts_with(&format!("[{}] histogram:", id)));
        assert!(render(OutputFormat::Exitcode, &envelope).unwrap().is_none());
    }
}
