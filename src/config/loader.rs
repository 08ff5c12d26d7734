//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub screener: ScreenerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Screener client configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenerSection {
    /// Aggregator REST API base URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per logical fetch, first try included
    pub max_attempts: u32,
    /// Backoff before the second attempt, in milliseconds
    pub backoff_base_ms: u64,
    /// Backoff growth factor per attempt
    pub backoff_multiplier: u32,
    /// Concurrently in-flight request cap
    pub max_concurrent_requests: usize,
    /// Wait on HTTP 429 when the server omits Retry-After, in seconds
    pub rate_limit_wait_secs: u64,
}

impl ScreenerSection {
    /// Get base URL with environment variable override
    /// Checks SCREENER_BASE_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        std::env::var("SCREENER_BASE_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Logging configuration section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screener.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".to_string(),
            ));
        }

        if self.screener.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "timeout_secs must be > 0, got {}",
                self.screener.timeout_secs
            )));
        }

        if self.screener.max_attempts == 0 {
            return Err(ConfigError::ValidationError(format!(
                "max_attempts must be > 0, got {}",
                self.screener.max_attempts
            )));
        }

        if self.screener.backoff_multiplier == 0 {
            return Err(ConfigError::ValidationError(format!(
                "backoff_multiplier must be >= 1, got {}",
                self.screener.backoff_multiplier
            )));
        }

        if self.screener.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationError(format!(
                "max_concurrent_requests must be > 0, got {}",
                self.screener.max_concurrent_requests
            )));
        }

        Ok(())
    }
}

// Conversion from Config to the adapter's ScreenerConfig
impl From<&Config> for crate::adapters::dexscreener::ScreenerConfig {
    fn from(config: &Config) -> Self {
        use crate::adapters::dexscreener::{RetryPolicy, ScreenerConfig};

        ScreenerConfig {
            base_url: config.screener.get_base_url(),
            max_concurrent_requests: config.screener.max_concurrent_requests,
            retry: RetryPolicy {
                max_attempts: config.screener.max_attempts,
                base_delay: Duration::from_millis(config.screener.backoff_base_ms),
                multiplier: config.screener.backoff_multiplier,
                timeout: Duration::from_secs(config.screener.timeout_secs),
                rate_limit_wait: Duration::from_secs(config.screener.rate_limit_wait_secs),
            },
        }
    }
}
