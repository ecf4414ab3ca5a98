//! Editor configuration with documented constants
//!
//! Everything tunable about the engine boundary lives here: how much undo
//! history is kept, how many presets stay cached and how long a preset fetch
//! may take before it is abandoned.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{ForgeError, Result};

/// Configuration for the editor engine and its preset collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    // === HISTORY ===
    /// Maximum number of full-state snapshots kept for undo/redo
    ///
    /// When a new snapshot would exceed this, the oldest entries are evicted.
    pub max_history_states: usize,

    // === PRESETS ===
    /// Number of custom presets kept in memory after being fetched
    ///
    /// Eviction is oldest-inserted first, not least-recently-used.
    pub preset_cache_capacity: usize,

    /// Deadline for a single preset request
    pub fetch_timeout: Duration,

    /// Base URL preset paths are resolved against
    ///
    /// Base presets live at `{base}/base/{class}.json`, custom presets at
    /// `{base}/custom/{filename}.json`, the catalog at `{base}/presets.json`.
    pub preset_base_url: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_states: 10,
            preset_cache_capacity: 15,
            fetch_timeout: Duration::from_millis(5000),
            preset_base_url: "presets".into(),
        }
    }
}

/// On-disk shape of the config, every field optional
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigFile {
    max_history_states: usize,
    preset_cache_capacity: usize,
    fetch_timeout_ms: u64,
    preset_base_url: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config = EditorConfig::default();
        Self {
            max_history_states: config.max_history_states,
            preset_cache_capacity: config.preset_cache_capacity,
            fetch_timeout_ms: config.fetch_timeout.as_millis() as u64,
            preset_base_url: config.preset_base_url,
        }
    }
}

impl EditorConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ForgeError::Config(e.to_string()))?;

        let config = Self {
            max_history_states: file.max_history_states,
            preset_cache_capacity: file.preset_cache_capacity,
            fetch_timeout: Duration::from_millis(file.fetch_timeout_ms),
            preset_base_url: file.preset_base_url,
        };
        config.validate().map_err(ForgeError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_history_states == 0 {
            return Err("max_history_states must be at least 1".into());
        }

        if self.preset_cache_capacity == 0 {
            return Err("preset_cache_capacity must be at least 1".into());
        }

        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be positive".into());
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<EditorConfig> = OnceLock::new();

/// Get the global editor config (initializes with defaults if not set)
pub fn config() -> &'static EditorConfig {
    CONFIG.get_or_init(EditorConfig::default)
}

/// Set the global editor config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: EditorConfig) -> std::result::Result<(), EditorConfig> {
    CONFIG.set(config)
}
