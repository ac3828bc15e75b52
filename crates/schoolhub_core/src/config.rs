//! Process-wide startup configuration.
//!
//! # Responsibility
//! - Describe everything the embedding process must supply at startup:
//!   database location, logging settings, push gateway endpoint.
//! - Keep configuration explicit; services receive what they need as
//!   constructor arguments instead of reading ambient globals.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

fn default_log_level() -> String {
    crate::logging::default_log_level().to_string()
}

/// Startup configuration for the core.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file path.
    pub database_path: PathBuf,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    /// Log level; defaults per build mode when omitted.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the external push delivery collaborator.
    pub push_base_url: String,
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config file: {err}"),
            Self::Parse(err) => write!(f, "malformed config file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&raw).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::io::Write;

    #[test]
    fn loads_full_config_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "database_path": "/var/lib/schoolhub/schoolhub.db",
                "log_dir": "/var/log/schoolhub",
                "log_level": "warn",
                "push_base_url": "http://push.local/"
            }}"#
        )
        .unwrap();

        let config = CoreConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.push_base_url, "http://push.local/");
    }

    #[test]
    fn log_level_defaults_when_omitted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "database_path": "db.sqlite",
                "log_dir": "/var/log/schoolhub",
                "push_base_url": "http://push.local/"
            }}"#
        )
        .unwrap();

        let config = CoreConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.log_level, crate::logging::default_log_level());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = CoreConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
