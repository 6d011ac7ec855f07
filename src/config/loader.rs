//! # Configuration Loader
//!
//! Environment-aware configuration loading. Handles YAML file discovery,
//! environment detection, and override merging: base file, then an optional
//! `custody-events-{env}.yaml` overlay, then `CUSTODY_EVENTS_*` environment
//! variables.

use super::CustodyEventsConfig;
use crate::error::{EventsError, EventsResult};
use config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Loaded configuration plus the environment it was resolved for
pub struct ConfigManager {
    config: CustodyEventsConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> EventsResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> EventsResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit environment.
    /// Useful for tests that must not touch global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> EventsResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let base = config_directory.join("custody-events.yaml");
        let overlay = config_directory.join(format!("custody-events-{environment}.yaml"));

        let config: CustodyEventsConfig = Config::builder()
            .add_source(File::from(base).required(true))
            .add_source(File::from(overlay).required(false))
            .add_source(
                Environment::with_prefix("CUSTODY_EVENTS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| EventsError::configuration("loader", e.to_string()))?
            .try_deserialize()
            .map_err(|e| EventsError::configuration("loader", e.to_string()))?;

        config.validate()?;

        tracing::info!(
            environment = %environment,
            poll_name = %config.poller.poll_name,
            raw_topic = %config.queues.raw_events_topic,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
        }))
    }

    /// Access the loaded configuration
    pub fn config(&self) -> &CustodyEventsConfig {
        &self.config
    }

    /// The environment this configuration was resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    fn detect_environment() -> String {
        env::var("CUSTODY_EVENTS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("CUSTODY_EVENTS_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_directory() {
        std::env::remove_var("CUSTODY_EVENTS_CONFIG_DIR");
        assert_eq!(
            ConfigManager::default_config_directory(),
            PathBuf::from("config")
        );
    }

    #[test]
    fn test_missing_base_file_is_configuration_error() {
        let result = ConfigManager::load_from_directory_with_env(
            Some(PathBuf::from("/nonexistent/config/dir")),
            "test",
        );
        assert!(matches!(
            result,
            Err(EventsError::Configuration { .. })
        ));
    }
}
