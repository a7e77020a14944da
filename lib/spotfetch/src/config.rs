//! Configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

use crate::history::DEFAULT_MAX_ENTRIES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required {0} env var")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Metadata API base URL (required)
    pub api_url: String,
    /// Metadata API key, sent as `X-API-Key` (optional)
    pub api_key: Option<String>,
    /// SQLite database URL for fetch history (default: "sqlite:spotfetch_history.db")
    pub history_database_url: String,
    /// Maximum number of history entries kept (default: 10000)
    pub history_max_entries: usize,
    /// Timeout for requests without an explicit one (default: 30s)
    pub request_timeout: Duration,
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: std::env::var("SPOTFETCH_API_URL")
                .map_err(|_| ConfigError::Missing("SPOTFETCH_API_URL"))?,
            api_key: std::env::var("SPOTFETCH_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            history_database_url: std::env::var("HISTORY_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:spotfetch_history.db".to_string()),
            history_max_entries: parse_var("HISTORY_MAX_ENTRIES", DEFAULT_MAX_ENTRIES)?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30u64)?),
        })
    }

    /// Get the metadata API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the history database URL.
    pub fn history_database_url(&self) -> &str {
        &self.history_database_url
    }
}
