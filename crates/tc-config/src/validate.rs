//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::analysis::AnalysisConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }

    /// The offending field, when one is known.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<ValidationError> for tc_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) => tc_common::Error::Config(msg),
            other => tc_common::Error::InvalidConfig(other.to_string()),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_analysis(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.resource.units_per_resource == 0 {
        return Err(invalid("resource.units_per_resource", "Must be positive, got 0"));
    }
    if config.resource.tokens_available == 0 {
        return Err(invalid("resource.tokens_available", "Must be positive, got 0"));
    }
    if config.histogram.bin_size == 0 {
        return Err(invalid("histogram.bin_size", "Must be positive, got 0"));
    }

    validate_percent("thresholds.buy_above_pct", config.thresholds.buy_above_pct)?;
    validate_percent(
        "thresholds.reduce_below_pct",
        config.thresholds.reduce_below_pct,
    )?;
    if config.thresholds.reduce_below_pct > config.thresholds.buy_above_pct {
        return Err(ValidationError::SemanticError(format!(
            "thresholds.reduce_below_pct ({}) must not exceed thresholds.buy_above_pct ({})",
            config.thresholds.reduce_below_pct, config.thresholds.buy_above_pct
        )));
    }

    if !config.ingest.delimiter.is_ascii() || matches!(config.ingest.delimiter, '"' | '\n' | '\r')
    {
        return Err(invalid(
            "ingest.delimiter",
            format!(
                "Must be a single ASCII character other than a quote or newline, got {:?}",
                config.ingest.delimiter
            ),
        ));
    }

    let schema = &config.ingest.schema;
    if schema.user.is_empty() {
        return Err(invalid("ingest.schema.user", "At least one column is required"));
    }
    if schema.start.is_empty() {
        return Err(invalid("ingest.schema.start", "At least one column is required"));
    }
    if schema.end.is_empty() {
        return Err(invalid("ingest.schema.end", "At least one column is required"));
    }

    if config.engine.slice_len == 0 {
        return Err(invalid("engine.slice_len", "Must be positive, got 0"));
    }
    if config.ranking.top_n == 0 {
        return Err(invalid("ranking.top_n", "Must be positive, got 0"));
    }

    Ok(())
}

fn validate_percent(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 100], got {}", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        validate_analysis(&AnalysisConfig::default()).unwrap();
    }

    #[test]
    fn test_zero_units_rejected() {
        let mut config = AnalysisConfig::default();
        config.resource.units_per_resource = 0;
        let err = validate_analysis(&config).unwrap_err();
        assert_eq!(err.field(), Some("resource.units_per_resource"));
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn test_inverted_percent_bands_rejected() {
        let mut config = AnalysisConfig::default();
        config.thresholds.reduce_below_pct = 95.0;
        assert!(matches!(
            validate_analysis(&config).unwrap_err(),
            ValidationError::SemanticError(_)
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let config = AnalysisConfig {
            schema_version: "0.9.0".to_string(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            validate_analysis(&config).unwrap_err(),
            ValidationError::VersionMismatch { .. }
        ));
    }

    #[test]
    fn test_quote_delimiter_rejected() {
        let mut config = AnalysisConfig::default();
        config.ingest.delimiter = '"';
        assert_eq!(
            validate_analysis(&config).unwrap_err().field(),
            Some("ingest.delimiter")
        );
    }

    #[test]
    fn test_converts_to_config_error() {
        let err: tc_common::Error = ValidationError::ParseError("bad".into()).into();
        assert_eq!(err.code(), 11);
    }
}
