//! Process configuration models.
//!
//! Loaded once at startup and passed explicitly into component
//! constructors; never ambient mutable state.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub executor: ExecutorSettings,
    pub governance: GovernanceConfig,
    pub logging: LoggingConfig,
    /// Path to the capability registry document.
    pub registry_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor: ExecutorSettings::default(),
            governance: GovernanceConfig::default(),
            logging: LoggingConfig::default(),
            registry_path: ".praetor/capabilities.yaml".to_string(),
        }
    }
}

/// Scheduler/executor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Maximum concurrently running actions within one task.
    pub max_concurrency: usize,
    /// Default per-action timeout when a plan does not supply one.
    pub default_action_timeout_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            default_action_timeout_secs: 600,
        }
    }
}

/// Governance configuration: the protected-resource blacklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Exact paths or glob patterns no action may ever target.
    pub blacklist: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            blacklist: vec![
                ".env".to_string(),
                "*.key".to_string(),
                "*.pem".to_string(),
                "**/secrets/**".to_string(),
            ],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    /// One of: json, pretty.
    pub format: String,
    /// Optional directory for rolling log files; stderr only when absent.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            directory: None,
        }
    }
}
