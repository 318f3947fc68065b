//! # Floor Configuration
//!
//! Typed configuration for the floor core. Every section has working
//! defaults, so an empty configuration directory yields an in-memory store
//! with the standard retry and numbering policy. See [`loader`] for how
//! files and environment variables are layered on top.

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::constants::{defaults, store::ORDER_NUMBER_COUNTER};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub store: StoreConfig,
    pub lifecycle: LifecycleConfig,
    pub numbering: NumberingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: defaults::DATABASE_MAX_CONNECTIONS,
            acquire_timeout_ms: defaults::DATABASE_ACQUIRE_TIMEOUT_MS,
        }
    }
}

/// Optimistic-concurrency retry policy for machine transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Attempts after the first before `ConflictRetryable` is surfaced
    pub max_conflict_retries: u32,
    /// Base delay; doubles on each retry up to a fixed cap. Zero only yields.
    pub retry_backoff_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: defaults::MAX_CONFLICT_RETRIES,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
        }
    }
}

impl LifecycleConfig {
    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry
            .saturating_sub(1)
            .min(defaults::RETRY_BACKOFF_MAX_SHIFT);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << shift))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    pub counter_key: String,
    pub min_width: usize,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            counter_key: ORDER_NUMBER_COUNTER.to_string(),
            min_width: defaults::ORDER_NUMBER_MIN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl FloorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.backend == StoreBackend::Postgres
            && self
                .store
                .database_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigurationError::missing_required_field(
                "store.database_url",
                "postgres store configuration",
            ));
        }

        if self.store.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "store.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        if self.numbering.min_width == 0 {
            return Err(ConfigurationError::invalid_value(
                "numbering.min_width",
                "0",
                "order numbers need at least one digit",
            ));
        }

        if self.numbering.counter_key.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "numbering.counter_key",
                "numbering configuration",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FloorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.lifecycle.max_conflict_retries, 5);
        assert_eq!(config.numbering.counter_key, "production_order_number");
        assert_eq!(config.numbering.min_width, 4);
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = FloorConfig::default();
        config.store.backend = StoreBackend::Postgres;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));

        config.store.database_url = Some("postgresql://floor@localhost/floor".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_and_width_rejected() {
        let mut config = FloorConfig::default();
        config.store.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = FloorConfig::default();
        config.numbering.min_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let lifecycle = LifecycleConfig {
            max_conflict_retries: 10,
            retry_backoff_ms: 2,
        };
        assert_eq!(lifecycle.backoff_for(1), Duration::from_millis(2));
        assert_eq!(lifecycle.backoff_for(2), Duration::from_millis(4));
        assert_eq!(lifecycle.backoff_for(3), Duration::from_millis(8));
        assert_eq!(lifecycle.backoff_for(50), Duration::from_millis(128));

        let no_wait = LifecycleConfig {
            max_conflict_retries: 3,
            retry_backoff_ms: 0,
        };
        assert_eq!(no_wait.backoff_for(4), Duration::ZERO);
    }
}
