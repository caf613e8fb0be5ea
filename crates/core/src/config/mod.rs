//! Application configuration with layered loading.
//!
//! Uses figment to layer configuration from:
//!
//! 1. Environment variables (TRIPSYNC_*)
//! 2. TOML config file (if TRIPSYNC_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::RevalidationPolicy;

mod validation;

pub use validation::ConfigError;

/// Sync layer configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TRIPSYNC_*)
/// 2. TOML config file (if TRIPSYNC_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Path to the SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the itinerary API; documents live at `{base_url}/itineraries/{id}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Known-reachable endpoint probed before revalidating.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Reachability probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-attempt HTTP timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Relative jitter applied to each delay, 0.0 to 1.0.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,

    /// Age in seconds after which a cached document is revalidated.
    #[serde(default = "default_soft_revalidate_secs")]
    pub soft_revalidate_secs: u64,

    /// Age in seconds after which a cached document is discarded.
    #[serde(default = "default_hard_expiry_secs")]
    pub hard_expiry_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tripsync-cache.sqlite")
}

fn default_base_url() -> String {
    "https://api.tripsync.app/v1".into()
}

fn default_probe_url() -> String {
    "https://clients3.google.com/generate_204".into()
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "tripsync/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter_factor() -> f64 {
    0.2
}

fn default_soft_revalidate_secs() -> u64 {
    30 * 60
}

fn default_hard_expiry_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            base_url: default_base_url(),
            probe_url: default_probe_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_factor: default_jitter_factor(),
            soft_revalidate_secs: default_soft_revalidate_secs(),
            hard_expiry_secs: default_hard_expiry_secs(),
        }
    }
}

impl SyncConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Staleness thresholds for the cache.
    pub fn revalidation_policy(&self) -> RevalidationPolicy {
        RevalidationPolicy::new(
            Duration::from_secs(self.soft_revalidate_secs),
            Duration::from_secs(self.hard_expiry_secs),
        )
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TRIPSYNC_`
    /// 2. TOML file from `TRIPSYNC_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TRIPSYNC_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TRIPSYNC_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
