use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/countersync/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("countersync").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sync = &self.sync;

        if sync.quiet_period_ms == 0 {
            return Err(invalid("sync.quiet_period_ms must be greater than zero"));
        }

        for (field, value) in [("sync.path", &sync.path), ("sync.page_path", &sync.page_path)] {
            if !value.starts_with('/') {
                return Err(invalid(&format!(
                    "{} must be an absolute path, got '{}'",
                    field, value
                )));
            }
        }

        if sync.target.trim().is_empty() {
            return Err(invalid("sync.target must not be empty"));
        }

        match Url::parse(&sync.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => {
                return Err(invalid(&format!(
                    "sync.endpoint must be an absolute http(s) URL, got '{}'",
                    sync.endpoint
                )))
            }
        }

        if self.csrf.cookie_name.trim().is_empty() || self.csrf.header_name.trim().is_empty() {
            return Err(invalid("csrf.cookie_name and csrf.header_name must not be empty"));
        }

        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(&format!(
                "server.bind_addr '{}' is not a valid socket address",
                self.server.bind_addr
            )));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}
