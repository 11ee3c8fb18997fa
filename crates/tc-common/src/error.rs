//! Error types for token concurrency analysis.
//!
//! Two layers:
//! - [`InvalidRecord`]: why a single raw record was dropped by the normalizer.
//!   Never fatal; callers count these and report "N of M records skipped".
//! - [`Error`]: failures of a whole call (bad parameters, cancellation,
//!   unreadable input, configuration problems), each with a stable code.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 30,
//!   "category": "analysis",
//!   "message": "invalid parameter bin_size=0: must be positive",
//!   "recoverable": true,
//!   "suggested_action": "fix_arguments",
//!   "context": { "parameter": "bin_size" }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for token concurrency operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Source reading and record errors.
    Input,
    /// Analysis parameter and execution errors.
    Analysis,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Re-invoke with corrected arguments.
    FixArguments,
    /// Run the config validator.
    RunCheck,
    /// Inspect or repair the input file.
    FixInput,
    /// Re-run the analysis (possibly with a longer deadline).
    Rerun,
    /// Nothing to do; a newer request replaced this one.
    None,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::FixArguments => write!(f, "fix_arguments"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::Rerun => write!(f, "rerun"),
            SuggestedAction::None => write!(f, "none"),
        }
    }
}

/// Why a raw record could not become an [`Interval`](crate::Interval).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidRecord {
    #[error("missing subject identity")]
    MissingSubject,

    #[error("missing {field} time")]
    MissingTime { field: String },

    #[error("unparseable {field} time: {value:?}")]
    UnparseableTime { field: String, value: String },

    #[error("start {start} is after end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Unified error type for token concurrency analysis.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),

    // Input errors (20-29)
    #[error("failed to read input: {0}")]
    Ingest(String),

    #[error("unsupported input format: {0}")]
    UnsupportedInput(String),

    // Analysis errors (30-39)
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("analysis cancelled after {steps_done} steps")]
    Cancelled { steps_done: usize },

    #[error("analysis superseded by request {current} (this was {generation})")]
    Superseded { generation: u64, current: u64 },

    #[error("analysis timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("internal error: {0}")]
    Internal(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a rejected parameter.
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Analysis errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::Ingest(_) => 20,
            Error::UnsupportedInput(_) => 21,
            Error::InvalidParameter { .. } => 30,
            Error::Cancelled { .. } => 31,
            Error::Superseded { .. } => 32,
            Error::Timeout { .. } => 33,
            Error::Internal(_) => 39,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::Ingest(_) | Error::UnsupportedInput(_) => ErrorCategory::Input,
            Error::InvalidParameter { .. }
            | Error::Cancelled { .. }
            | Error::Superseded { .. }
            | Error::Timeout { .. }
            | Error::Internal(_) => ErrorCategory::Analysis,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether the caller can expect a different outcome by re-invoking.
    ///
    /// Analyses are deterministic, so only a change of input, arguments or
    /// deadline makes a difference.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Superseded { .. } | Error::Internal(_))
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => SuggestedAction::RunCheck,
            Error::Ingest(_) | Error::UnsupportedInput(_) | Error::Json(_) => {
                SuggestedAction::FixInput
            }
            Error::InvalidParameter { .. } => SuggestedAction::FixArguments,
            Error::Cancelled { .. } | Error::Timeout { .. } | Error::Io(_) => {
                SuggestedAction::Rerun
            }
            Error::Superseded { .. } | Error::Internal(_) => SuggestedAction::None,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => {
                "Run 'tc-core config validate' and fix the reported field, or remove the file to use defaults."
            }
            Error::Ingest(_) => {
                "Check that the file exists, is readable, and has a header row with the expected columns."
            }
            Error::UnsupportedInput(_) => "Use a .csv, .json (array) or .jsonl input file.",
            Error::InvalidParameter { .. } => {
                "Bin size and users per token must be positive integers."
            }
            Error::Cancelled { .. } => "The analysis was cancelled; re-run it when ready.",
            Error::Superseded { .. } => "A newer request replaced this one; use its result instead.",
            Error::Timeout { .. } => "Raise '--timeout' or narrow the date range with '--month'.",
            Error::Internal(_) => "This is a bug; please report it with the command that triggered it.",
            Error::Io(_) => "Check file permissions and disk space, then retry.",
            Error::Json(_) => "Invalid JSON in input. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Analysis Configuration",
            Error::Ingest(_) => "Input Error",
            Error::UnsupportedInput(_) => "Unsupported Input",
            Error::InvalidParameter { .. } => "Invalid Parameter",
            Error::Cancelled { .. } => "Analysis Cancelled",
            Error::Superseded { .. } => "Analysis Superseded",
            Error::Timeout { .. } => "Analysis Timeout",
            Error::Internal(_) => "Internal Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidParameter { name, value, .. } => {
                context.insert("parameter".to_string(), serde_json::json!(name));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::Cancelled { steps_done } => {
                context.insert("steps_done".to_string(), serde_json::json!(steps_done));
            }
            Error::Superseded {
                generation,
                current,
            } => {
                context.insert("generation".to_string(), serde_json::json!(generation));
                context.insert("current".to_string(), serde_json::json!(current));
            }
            Error::Timeout { seconds } => {
                context.insert("timeout_seconds".to_string(), serde_json::json!(seconds));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
