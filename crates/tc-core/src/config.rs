//! Configuration loading for tc-core.
//!
//! Wraps `tc-config` resolution with the CLI's rule that an explicit
//! `--config` path must exist, then validates and snapshots the result.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use tc_config::validate::ValidationError;
pub use tc_config::{AnalysisConfig, ConfigPaths, ConfigSnapshot, ConfigSource};

use tc_config::{resolve_config, validate_analysis};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl From<ConfigError> for tc_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { .. } => tc_common::Error::Config(err.to_string()),
            ConfigError::Invalid { .. } => tc_common::Error::InvalidConfig(err.to_string()),
            ConfigError::ValidationError(inner) => inner.into(),
        }
    }
}

/// Effective configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: AnalysisConfig,
    pub paths: ConfigPaths,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.config, &self.paths)
    }
}

/// Resolve, parse and validate the analysis configuration.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let paths = resolve_config(cli_path);
    let config = match &paths.analysis {
        Some(path) => AnalysisConfig::from_file(path).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?,
        None => AnalysisConfig::default(),
    };
    validate_analysis(&config)?;

    Ok(ResolvedConfig { config, paths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_cli_path_is_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/analysis.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        let converted: tc_common::Error = err.into();
        assert_eq!(converted.code(), 10);
    }

    #[test]
    fn test_cli_path_loaded_and_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, r#"{"histogram": {"bin_size": 4}}"#).unwrap();

        let resolved = load_config(Some(&path)).unwrap();
        assert_eq!(resolved.config.histogram.bin_size, 4);
        assert_eq!(resolved.paths.source, ConfigSource::CliArgument);
        assert_eq!(resolved.snapshot().summary.bin_size, 4);
    }

    #[test]
    fn test_semantic_failure_surfaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, r#"{"resource": {"units_per_resource": 0}}"#).unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let converted: tc_common::Error = err.into();
        assert_eq!(converted.code(), 11);
    }

    #[test]
    fn test_parse_failure_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("analysis.json"));
    }
}
