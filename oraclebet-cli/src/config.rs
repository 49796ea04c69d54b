//! CLI configuration and logging setup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "oraclebet.toml";

/// Default location of the registry state
pub const DEFAULT_STATE_FILE: &str = "oraclebet-state.json";

/// Environment variable overriding `state_path`
pub const STATE_ENV_VAR: &str = "ORACLEBET_STATE";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the registry and all markets
    pub state_path: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `oraclebet.toml` if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(config.with_state_override(std::env::var(STATE_ENV_VAR).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_state_override(mut self, state_path: Option<String>) -> Self {
        if let Some(path) = state_path.filter(|path| !path.is_empty()) {
            self.state_path = PathBuf::from(path);
        }
        self
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// Logs go to stderr so command output stays clean.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::parse_toml(
            r#"
            state_path = "/tmp/markets.json"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.state_path, PathBuf::from("/tmp/markets.json"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(Config::parse_toml("state_path = 5").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(Config::from_file(Path::new("/nonexistent/oraclebet.toml")).is_err());
    }

    #[test]
    fn test_state_override() {
        let config = Config::default().with_state_override(Some("other.json".to_string()));
        assert_eq!(config.state_path, PathBuf::from("other.json"));

        let config = Config::default().with_state_override(Some(String::new()));
        assert_eq!(config.state_path, PathBuf::from(DEFAULT_STATE_FILE));
    }
}
