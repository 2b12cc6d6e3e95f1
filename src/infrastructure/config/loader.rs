use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrency: {0}. Must be between 1 and 64")]
    InvalidMaxConcurrency(usize),

    #[error("Invalid default_action_timeout_secs: {0}. Must be positive")]
    InvalidDefaultTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Registry path cannot be empty")]
    EmptyRegistryPath,

    #[error("Blacklist pattern cannot be empty")]
    EmptyBlacklistPattern,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .praetor/config.yaml (project config)
    /// 3. .praetor/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PRAETOR_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.praetor/) so multiple
    /// projects on one machine stay independent.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".praetor/config.yaml"))
            .merge(Yaml::file(".praetor/local.yaml"))
            .merge(Env::prefixed("PRAETOR_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.executor.max_concurrency == 0 || config.executor.max_concurrency > 64 {
            return Err(ConfigError::InvalidMaxConcurrency(
                config.executor.max_concurrency,
            ));
        }

        if config.executor.default_action_timeout_secs == 0 {
            return Err(ConfigError::InvalidDefaultTimeout(
                config.executor.default_action_timeout_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.registry_path.is_empty() {
            return Err(ConfigError::EmptyRegistryPath);
        }

        if config.governance.blacklist.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyBlacklistPattern);
        }

        Ok(())
    }
}
