//! Serializable CorrLab configuration.
//!
//! Every section and field has a default, so an empty TOML document is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrLabConfig {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub matrix: MatrixConfig,
}

/// Upstream provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// TTL and retry policy for `RetryingCache`.
/// Upper bound accepted for `cache.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries younger than this are served without touching the provider.
    pub ttl_ms: u64,
    /// Retries after the first attempt (total attempts = max_retries + 1).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_delay_ms: u64,
    /// Serialize concurrent resolves of the same key.
    pub coalesce_in_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 30_000,
            max_retries: 3,
            initial_delay_ms: 1_000,
            coalesce_in_flight: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Backoff before retry number `attempt_index + 1`: `initial * 2^attempt_index`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        self.initial_delay()
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

/// Defaults for correlation-matrix requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub window_minutes: u32,
    pub limit: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            window_minutes: 60,
            limit: crate::stats::matrix::DEFAULT_LIMIT,
        }
    }
}

impl CorrLabConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: CorrLabConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".into()));
        }
        if self.provider.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "provider.request_timeout_ms must be positive".into(),
            ));
        }
        if self.cache.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "cache.max_retries must be at most {MAX_RETRIES_LIMIT}"
            )));
        }
        if self.matrix.limit == 0 {
            return Err(ConfigError::Invalid("matrix.limit must be positive".into()));
        }
        if self.matrix.window_minutes == 0 {
            return Err(ConfigError::Invalid(
                "matrix.window_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}
