//! Configuration Loader
//!
//! Environment-aware layering with the `config` crate. Sources, lowest
//! precedence first:
//!
//! 1. built-in defaults (the `Default` impl of each section)
//! 2. `floor.{toml,yaml,json}` in the configuration directory
//! 3. `floor.{environment}.{toml,yaml,json}` in the same directory
//! 4. `FLOOR_`-prefixed environment variables, `__` separating sections,
//!    e.g. `FLOOR_LIFECYCLE__MAX_CONFLICT_RETRIES=8`

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::FloorConfig;

const CONFIG_BASENAME: &str = "floor";
const ENV_PREFIX: &str = "FLOOR";
const EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug)]
pub struct ConfigManager {
    config: FloorConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Environment variables still apply on top.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = environment,
            store_backend = %config.store.backend,
            max_conflict_retries = config.lifecycle.max_conflict_retries,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    pub fn config(&self) -> &FloorConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// `FLOOR_ENV`, then `APP_ENV`, defaulting to `development`
    pub fn detect_environment() -> String {
        env::var("FLOOR_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("FLOOR_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn locate(config_directory: &Path, stem: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| config_directory.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    }

    fn build(config_directory: &Path, environment: &str) -> ConfigResult<FloorConfig> {
        let mut builder = Config::builder();
        let stems = [
            CONFIG_BASENAME.to_string(),
            format!("{CONFIG_BASENAME}.{environment}"),
        ];
        for stem in &stems {
            if let Some(path) = Self::locate(config_directory, stem) {
                debug!("Layering configuration file {}", path.display());
                builder = builder.add_source(File::from(path));
            }
        }

        // Missing keys fall back to the serde defaults on each section
        let layered = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(config_directory.display().to_string(), e))?;

        layered
            .try_deserialize::<FloorConfig>()
            .map_err(|e| ConfigurationError::load_error("merged configuration", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().numbering.min_width, 4);
        assert_eq!(manager.config().store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("floor.toml"),
            "[lifecycle]\nmax_conflict_retries = 3\nretry_backoff_ms = 10\n\n[numbering]\nmin_width = 5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("floor.staging.toml"),
            "[lifecycle]\nmax_conflict_retries = 9\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging")
                .unwrap();
        let config = manager.config();
        assert_eq!(config.lifecycle.max_conflict_retries, 9);
        assert_eq!(config.lifecycle.retry_backoff_ms, 10);
        assert_eq!(config.numbering.min_width, 5);
        assert_eq!(config.numbering.counter_key, "production_order_number");
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("floor.toml"),
            "[store]\nbackend = \"postgres\"\n",
        )
        .unwrap();

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("floor.toml"), "[lifecycle\nbroken").unwrap();

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(matches!(result, Err(ConfigurationError::LoadError { .. })));
    }
}
