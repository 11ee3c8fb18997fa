//! Exit codes for the tc-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-6: Operational outcomes
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use tc_common::{Error, ErrorCategory};

/// Exit codes for tc-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Analysis ran and produced a result.
    Clean = 0,

    /// No usable records remained after normalization and date filtering.
    NoData = 1,

    /// Cancelled before completion.
    Interrupted = 6,

    /// Invalid arguments or analysis parameters.
    ArgsError = 10,

    /// Configuration missing, unreadable or invalid.
    ConfigError = 11,

    /// Input unreadable or in an unsupported format.
    InputError = 12,

    /// Internal error (bug - please report).
    InternalError = 20,

    IoError = 21,

    /// `--timeout` elapsed.
    TimeoutError = 22,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-6 describe an outcome, not a failure.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NoData => "OK_NO_DATA",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
        }
    }

    /// Map an analysis error to the exit code a script should see.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Timeout { .. } => ExitCode::TimeoutError,
            Error::Cancelled { .. } | Error::Superseded { .. } => ExitCode::Interrupted,
            Error::InvalidParameter { .. } => ExitCode::ArgsError,
            Error::Json(_) => ExitCode::InputError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Input => ExitCode::InputError,
                ErrorCategory::Io => ExitCode::IoError,
                ErrorCategory::Analysis => ExitCode::InternalError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::NoData.is_operational());
        assert!(ExitCode::Interrupted.is_operational());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::TimeoutError.is_internal_error());
        assert!(!ExitCode::ArgsError.is_internal_error());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from_error(&Error::invalid_parameter("bin_size", 0, "must be positive")),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Timeout { seconds: 1 }),
            ExitCode::TimeoutError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Cancelled { steps_done: 0 }),
            ExitCode::Interrupted
        );
        assert_eq!(
            ExitCode::from_error(&Error::InvalidConfig("x".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Ingest("x".into())),
            ExitCode::InputError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Io(std::io::Error::other("disk"))),
            ExitCode::IoError
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::TimeoutError.to_string(), "ERR_TIMEOUT (22)");
    }
}
