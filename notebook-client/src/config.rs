//! Configuration loading for the Notebook client.
//!
//! A TOML file is read from the path the caller passes (the CLI takes it from
//! `--config` or `NOTEBOOK_CONFIG`). Without one, built-in defaults apply and
//! `NOTEBOOK_API_BASE_URL` may override the backend address.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5266";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub backend: BackendKind,
    pub session_path: PathBuf,
    pub local_store_path: PathBuf,
    pub log: LogConfig,
}

/// Which backend the stores talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Rest,
    /// Users and notes kept in a local JSON file.
    Local,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "notebook_client=info,warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            backend: BackendKind::Rest,
            session_path: data_dir.join("session.json"),
            local_store_path: data_dir.join("local-store.json"),
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("NOTEBOOK_API_BASE_URL") {
            config.api_base_url = url;
        }
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.session_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.backend == BackendKind::Local && self.local_store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "local_store_path",
                reason: "must not be empty when backend = \"local\"".to_string(),
            });
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".notebook"))
        .unwrap_or_else(|| PathBuf::from(".notebook"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
api_base_url = "https://notes.example.com"
request_timeout_ms = 5000
backend = "local"
session_path = "/tmp/nb/session.json"
local_store_path = "/tmp/nb/store.json"

[log]
filter = "debug"
json = true
"#;

    #[test]
    fn test_parses_full_config() {
        let config = ClientConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.api_base_url, "https://notes.example.com");
        assert_eq!(config.backend, BackendKind::Local);
        assert!(config.log.json);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let with_extra = SAMPLE.replace("[log]", "retries = 3\n\n[log]");
        assert!(matches!(
            ClientConfig::from_toml(&with_extra),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_default_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.request_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "request_timeout_ms", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = ClientConfig::default();
        config.api_base_url = "localhost:5266".to_string();
        assert!(config.validate().is_err());
        config.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notebook.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.request_timeout_ms, 5000);

        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            ClientConfig::load(Some(&missing)),
            Err(ConfigError::Io(_))
        ));
    }
}
