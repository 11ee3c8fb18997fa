//! Raw source records and the schema-variant field candidates used to read them.
//!
//! Source files in the wild name their columns differently (`START DATE` in
//! one export, `START TIMESTAMP` in another). A [`SourceSchema`] lists, per
//! canonical field, the candidate column names in priority order; the
//! normalizer resolves them once per record and later stages only ever see
//! the canonical [`Interval`](crate::Interval).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One untyped row from a tabular or JSON source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based row number in the source (0 when unknown).
    #[serde(default)]
    pub row: usize,

    /// Column name → cell text.
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(row: usize) -> Self {
        RawRecord {
            row,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    /// The trimmed cell for `column`, or `None` when missing or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank cell among `columns`, in order.
    pub fn first_of<'a>(&'a self, columns: &[String]) -> Option<&'a str> {
        columns.iter().find_map(|c| self.get(c))
    }
}

/// How a time column encodes its instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeEncoding {
    /// A calendar timestamp (RFC 3339 or a common naive layout, read as UTC).
    Absolute,
    /// Seconds since the Unix epoch.
    EpochSeconds,
}

/// A candidate column for a time field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldCandidate {
    pub column: String,
    pub encoding: TimeEncoding,
}

impl FieldCandidate {
    pub fn absolute(column: &str) -> Self {
        FieldCandidate {
            column: column.to_string(),
            encoding: TimeEncoding::Absolute,
        }
    }

    pub fn epoch_seconds(column: &str) -> Self {
        FieldCandidate {
            column: column.to_string(),
            encoding: TimeEncoding::EpochSeconds,
        }
    }
}

/// Ordered column candidates for every canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceSchema {
    pub user: Vec<String>,
    pub start: Vec<FieldCandidate>,
    pub end: Vec<FieldCandidate>,
    #[serde(default)]
    pub duration: Vec<String>,
    #[serde(default)]
    pub product: Vec<String>,
    #[serde(default)]
    pub server: Vec<String>,

    /// Compose subjects as `user__product__server` (session-accurate).
    #[serde(default = "default_compose")]
    pub compose_session_subject: bool,
}

fn default_compose() -> bool {
    true
}

impl Default for SourceSchema {
    fn default() -> Self {
        SourceSchema {
            user: vec!["USER".to_string()],
            start: vec![
                FieldCandidate::absolute("START DATE"),
                FieldCandidate::epoch_seconds("START TIMESTAMP"),
            ],
            end: vec![
                FieldCandidate::absolute("END DATE"),
                FieldCandidate::epoch_seconds("END TIMESTAMP"),
            ],
            duration: vec!["DURATION".to_string()],
            product: vec!["PRODUCT".to_string()],
            server: vec!["SERVER".to_string()],
            compose_session_subject: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_trims_and_skips_blank() {
        let rec = RawRecord::new(1).with("USER", "  alice ").with("PRODUCT", "   ");
        assert_eq!(rec.get("USER"), Some("alice"));
        assert_eq!(rec.get("PRODUCT"), None);
        assert_eq!(rec.get("SERVER"), None);
    }

    #[test]
    fn test_first_of_respects_order() {
        let rec = RawRecord::new(1).with("B", "second").with("A", "first");
        let cols = vec!["A".to_string(), "B".to_string()];
        assert_eq!(rec.first_of(&cols), Some("first"));
        let cols = vec!["C".to_string(), "B".to_string()];
        assert_eq!(rec.first_of(&cols), Some("second"));
    }

    #[test]
    fn test_default_schema_prefers_dates_over_epochs() {
        let schema = SourceSchema::default();
        assert_eq!(schema.start[0].encoding, TimeEncoding::Absolute);
        assert_eq!(schema.start[1].encoding, TimeEncoding::EpochSeconds);
        assert!(schema.compose_session_subject);
    }

    #[test]
    fn test_schema_deserialize_defaults() {
        let json = r#"{
            "user": ["login"],
            "start": [{"column": "from", "encoding": "epoch_seconds"}],
            "end": [{"column": "to", "encoding": "absolute"}]
        }"#;
        let schema: SourceSchema = serde_json::from_str(json).unwrap();
        assert!(schema.duration.is_empty());
        assert!(schema.compose_session_subject);
    }
}
