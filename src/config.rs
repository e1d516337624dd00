//! Crawler configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file, an empty file, or a file
//! that only overrides one value are all valid:
//!
//! ```yaml
//! timeout_secs: 20
//! senego:
//!   request_delay_ms: 750
//! ```

use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Identifying header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts for transient fetch failures. `0` disables retry.
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Upper bound of the random delay added to each backoff.
    pub retry_max_jitter_ms: u64,
    pub senenews: SourceConfig,
    pub senego: SourceConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Minimum pause between two consecutive requests to this source.
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            max_retries: 2,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8_000,
            retry_max_jitter_ms: 250,
            senenews: SourceConfig {
                enabled: true,
                base_url: "https://www.senenews.com".to_string(),
                request_delay_ms: 1_000,
            },
            senego: SourceConfig {
                enabled: true,
                base_url: "https://senego.com".to_string(),
                request_delay_ms: 500,
            },
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            request_delay_ms: 1_000,
        }
    }
}

impl CrawlerConfig {
    /// Load the configuration at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded crawler configuration");
        Ok(config)
    }

    /// Parse YAML, filling per-source fields that were left out.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(text)?;
        let defaults = Self::default();
        if config.senenews.base_url.is_empty() {
            config.senenews.base_url = defaults.senenews.base_url;
        }
        if config.senego.base_url.is_empty() {
            config.senego.base_url = defaults.senego.base_url;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SourceConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
