//! Configuration snapshots recorded with analysis output.
//!
//! A snapshot captures the exact configuration an analysis ran with, so a
//! report can be traced back to its settings and two runs can be compared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::AnalysisConfig;
use crate::resolve::{ConfigPaths, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// SHA-256 of the effective configuration (canonical JSON).
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub units_per_resource: u32,
    pub tokens_available: u32,
    pub bin_size: u32,
    pub peak_threshold: i64,
    pub buy_above_pct: f64,
    pub reduce_below_pct: f64,
}

impl ConfigSummary {
    fn from_config(config: &AnalysisConfig) -> Self {
        ConfigSummary {
            units_per_resource: config.resource.units_per_resource,
            tokens_available: config.resource.tokens_available,
            bin_size: config.histogram.bin_size,
            peak_threshold: config.thresholds.peak_threshold,
            buy_above_pct: config.thresholds.buy_above_pct,
            reduce_below_pct: config.thresholds.reduce_below_pct,
        }
    }
}

impl ConfigSnapshot {
    /// Snapshot the effective configuration.
    ///
    /// The hash covers the parsed configuration, not the file bytes, so a
    /// file that only restates the defaults hashes like no file at all.
    pub fn new(config: &AnalysisConfig, paths: &ConfigPaths) -> Self {
        let canonical = serde_json::to_string(config).unwrap_or_default();
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: paths.analysis.as_ref().map(|p| p.display().to_string()),
            config_source: paths.source.to_string(),
            config_hash: hash_content(&canonical),
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        Self::new(
            &AnalysisConfig::default(),
            &ConfigPaths {
                analysis: None,
                source: ConfigSource::BuiltinDefault,
            },
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same effective config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
