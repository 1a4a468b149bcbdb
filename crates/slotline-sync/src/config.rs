//! # Engine Configuration
//!
//! Configuration management for the scheduling engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SLOTLINE_POLL_INTERVAL_SECS=60                                     │
//! │     SLOTLINE_ENGINE_ENABLED=false                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/slotline/engine.toml (Linux)                             │
//! │     ~/Library/Application Support/io.slotline.slotline (macOS)         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     poll every 30s, engine enabled                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [engine]
//! enabled = true
//! poll_interval_secs = 30
//!
//! [storage]
//! database_path = "/var/lib/slotline/slotline.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Engine Settings
// =============================================================================

/// Refresh behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Whether the background poll feed runs at all.
    /// Manual refreshes and mutation-settled refreshes always work.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between background poll refreshes (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Storage location settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path to the SQLite database file. When unset, the platform data
    /// directory is used.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl StorageSettings {
    /// Resolves the database path, falling back to the platform data dir.
    pub fn resolve_database_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.database_path {
            return Some(path.clone());
        }
        directories::ProjectDirs::from("io", "slotline", "slotline")
            .map(|dirs| dirs.data_dir().join("slotline.db"))
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
///
/// ## Example Config File
/// ```toml
/// [engine]
/// enabled = true
/// poll_interval_secs = 30
///
/// [storage]
/// database_path = "/var/lib/slotline/slotline.db"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Refresh behavior settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Storage location settings.
    #[serde(default)]
    pub storage: StorageSettings,
}

impl EngineConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.engine.poll_interval_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("SLOTLINE_ENGINE_ENABLED") {
            if let Ok(parsed) = enabled.parse::<bool>() {
                debug!(enabled = parsed, "Overriding engine enabled from environment");
                self.engine.enabled = parsed;
            }
        }

        if let Ok(interval) = std::env::var("SLOTLINE_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                debug!(secs, "Overriding poll interval from environment");
                self.engine.poll_interval_secs = secs;
            }
        }

        if let Ok(path) = std::env::var("SLOTLINE_DB_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "slotline", "slotline")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    /// Returns the poll interval as a `Duration`.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.engine.poll_interval_secs)
    }
}
