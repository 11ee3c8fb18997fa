//! Analysis configuration types (`analysis.json`).
//!
//! Every section and field has a default, so an empty object `{}` (or no
//! file at all) yields the built-in configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;
use tc_common::SourceSchema;

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub resource: ResourceSettings,

    #[serde(default)]
    pub histogram: HistogramSettings,

    #[serde(default)]
    pub thresholds: ThresholdSettings,

    #[serde(default)]
    pub ingest: IngestSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub ranking: RankingSettings,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

/// Token model: how many users one token covers and how many are owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceSettings {
    #[serde(default = "default_units_per_resource")]
    pub units_per_resource: u32,

    #[serde(default = "default_tokens_available")]
    pub tokens_available: u32,
}

fn default_units_per_resource() -> u32 {
    3
}

fn default_tokens_available() -> u32 {
    72
}

impl Default for ResourceSettings {
    fn default() -> Self {
        ResourceSettings {
            units_per_resource: default_units_per_resource(),
            tokens_available: default_tokens_available(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistogramSettings {
    /// Bucket width in tokens.
    #[serde(default = "default_bin_size")]
    pub bin_size: u32,
}

fn default_bin_size() -> u32 {
    2
}

impl Default for HistogramSettings {
    fn default() -> Self {
        HistogramSettings {
            bin_size: default_bin_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdSettings {
    /// Token count used by `periods` and `occurrences` when no flag is given.
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: i64,

    /// Usage percentage above which buying more tokens is recommended.
    #[serde(default = "default_buy_above_pct")]
    pub buy_above_pct: f64,

    /// Usage percentage below which reducing tokens is suggested.
    #[serde(default = "default_reduce_below_pct")]
    pub reduce_below_pct: f64,
}

fn default_peak_threshold() -> i64 {
    10
}

fn default_buy_above_pct() -> f64 {
    90.0
}

fn default_reduce_below_pct() -> f64 {
    60.0
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        ThresholdSettings {
            peak_threshold: default_peak_threshold(),
            buy_above_pct: default_buy_above_pct(),
            reduce_below_pct: default_reduce_below_pct(),
        }
    }
}

/// How source files are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IngestSettings {
    /// CSV field delimiter (a single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub schema: SourceSchema,
}

fn default_delimiter() -> char {
    ','
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings {
            delimiter: default_delimiter(),
            schema: SourceSchema::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineSettings {
    /// Sweep steps between cancellation checks.
    #[serde(default = "default_slice_len")]
    pub slice_len: usize,
}

fn default_slice_len() -> usize {
    1000
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            slice_len: default_slice_len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RankingSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    10
}

impl Default for RankingSettings {
    fn default() -> Self {
        RankingSettings {
            top_n: default_top_n(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            schema_version: default_schema_version(),
            description: None,
            resource: ResourceSettings::default(),
            histogram: HistogramSettings::default(),
            thresholds: ThresholdSettings::default(),
            ingest: IngestSettings::default(),
            engine: EngineSettings::default(),
            ranking: RankingSettings::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// JSON Schema describing `analysis.json`.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(AnalysisConfig)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.resource.units_per_resource, 3);
        assert_eq!(config.resource.tokens_available, 72);
        assert_eq!(config.histogram.bin_size, 2);
        assert_eq!(config.thresholds.peak_threshold, 10);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"resource": {"tokens_available": 40}}"#).unwrap();
        assert_eq!(config.resource.tokens_available, 40);
        assert_eq!(config.resource.units_per_resource, 3);
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let err = AnalysisConfig::from_json(r#"{"tokens": 5}"#).unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_custom_schema_columns() {
        let json = r#"{
            "ingest": {
                "delimiter": ";",
                "schema": {
                    "user": ["LOGIN"],
                    "start": [{"column": "BEGIN", "encoding": "epoch_seconds"}],
                    "end": [{"column": "FINISH", "encoding": "absolute"}]
                }
            }
        }"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert_eq!(config.ingest.delimiter, ';');
        assert_eq!(config.ingest.schema.user, vec!["LOGIN".to_string()]);
        assert!(config.ingest.schema.duration.is_empty());
        assert!(config.ingest.schema.compose_session_subject);
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = AnalysisConfig::json_schema();
        let props = schema["properties"].as_object().unwrap();
        for key in ["resource", "histogram", "thresholds", "ingest", "engine", "ranking"] {
            assert!(props.contains_key(key), "missing {key}");
        }
    }
}
