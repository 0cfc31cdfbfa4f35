//! Configuration settings for repsync.
//!
//! Settings are loaded from `~/.repsync/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RepsyncError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Sync queue settings.
    pub sync: SyncConfig,
    /// Workout session persistence settings.
    pub session: SessionConfig,
    /// Remote data service settings.
    pub backend: BackendConfig,
}

/// Sync queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Retries after the first failed attempt before an operation is dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts of the same operation, in milliseconds.
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
}

/// Workout session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet window for low-urgency saves, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Remote data service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Authenticated principal used to scope remote writes.
    pub principal: Option<String>,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_pause_ms() -> u64 {
    100
}

const fn default_debounce_ms() -> u64 {
    500
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_pause_ms: default_retry_pause_ms(),
        }
    }
}

impl SyncConfig {
    /// Pause between attempts as a `Duration`.
    #[must_use]
    pub const fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SessionConfig {
    /// Debounce window as a `Duration`.
    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, RepsyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            RepsyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            RepsyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), RepsyncError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| RepsyncError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            RepsyncError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }
}
