//! Configuration for the memoization engine.
//!
//! Maps directly to `oncecache.toml`:
//!
//! ```toml
//! [general]
//! enabled = true
//! log_level = "info"
//!
//! [store]
//! sweep_interval = 64
//! max_entries_per_slot = 0
//! ```
//!
//! The engine never installs a `tracing` subscriber. `general.log_level` is
//! carried for the embedding application, which passes it to its own
//! subscriber filter (e.g. `tracing_subscriber::EnvFilter::new`).

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
pub struct OnceConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Store sizing and housekeeping.
    #[serde(default)]
    pub store: StoreConfig,
}

impl OnceConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MemoError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::MemoError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Initial state of the memoization switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Filter directive for the application's `tracing` subscriber
    /// (`"info"`, `"oncecache_core=debug"`, ...). Not read by the store.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// Store sizing and reclamation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Sweep reclaimed owners after this many memoized calls, or after as
    /// many calls as there are owner entries if the table is larger.
    /// `0` turns the automatic sweep off.
    #[serde(default = "default_64")]
    pub sweep_interval: u32,
    /// Per-slot entry cap; least recently used keys are evicted beyond it.
    /// `0` means unbounded.
    #[serde(default)]
    pub max_entries_per_slot: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval: 64,
            max_entries_per_slot: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_64() -> u32 { 64 }
