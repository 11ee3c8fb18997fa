//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path →
//! system path → built-in defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to analysis.json (or None if not found).
    pub analysis: Option<PathBuf>,

    /// Where it was found (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/token-concurrency/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "TOKEN_CONCURRENCY_CONFIG";
pub const ENV_CONFIG_DIR: &str = "TOKEN_CONCURRENCY_CONFIG_DIR";

/// Standard config file name.
pub const ANALYSIS_FILENAME: &str = "analysis.json";

/// Application name for XDG directories.
const APP_NAME: &str = "token-concurrency";

/// Resolve the analysis config path.
///
/// 1. Explicit CLI path (if it exists)
/// 2. `TOKEN_CONCURRENCY_CONFIG` (direct path)
/// 3. `TOKEN_CONCURRENCY_CONFIG_DIR` + `analysis.json`
/// 4. XDG config directory (`~/.config/token-concurrency/`)
/// 5. System config (`/etc/token-concurrency/`)
/// 6. Built-in defaults (None)
///
/// A CLI path that does not exist is skipped here; callers that treat an
/// explicit path as mandatory check for it themselves.
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let candidates = [
        (cli_path.map(Path::to_path_buf), ConfigSource::CliArgument),
        (
            std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from),
            ConfigSource::Environment,
        ),
        (
            std::env::var(ENV_CONFIG_DIR)
                .ok()
                .map(|dir| PathBuf::from(dir).join(ANALYSIS_FILENAME)),
            ConfigSource::Environment,
        ),
        (
            xdg_config_dir().map(|dir| dir.join(ANALYSIS_FILENAME)),
            ConfigSource::XdgConfig,
        ),
        (
            Some(system_config_dir().join(ANALYSIS_FILENAME)),
            ConfigSource::SystemConfig,
        ),
    ];

    for (path, source) in candidates {
        if let Some(path) = path.filter(|p| p.exists()) {
            return ConfigPaths {
                analysis: Some(path),
                source,
            };
        }
    }

    ConfigPaths::default()
}

/// Get the XDG config directory for token-concurrency.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_missing_cli_path_is_skipped() {
        let paths = resolve_config(Some(Path::new("/nonexistent/analysis.json")));
        assert_ne!(paths.source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(
            system_config_dir(),
            PathBuf::from("/etc/token-concurrency")
        );
    }
}
