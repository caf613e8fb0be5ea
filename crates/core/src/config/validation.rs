//! Configuration validation rules.
//!
//! Checks `SyncConfig` values after they have been loaded from environment,
//! files, or defaults.

use crate::config::SyncConfig;
use thiserror::Error;

/// Highest accepted `max_retries`.
const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl SyncConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `jitter_factor` is outside 0.0..=1.0
    /// - `base_delay_ms` exceeds `max_delay_ms`
    /// - `max_retries` exceeds 10
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `soft_revalidate_secs` is not below `hard_expiry_secs`
    /// - `user_agent` is empty
    /// - `base_url` or `probe_url` is not an absolute URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::Invalid {
                field: "jitter_factor".into(),
                reason: "must be between 0.0 and 1.0".into(),
            });
        }

        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::Invalid {
                field: "base_delay_ms".into(),
                reason: "must not exceed max_delay_ms".into(),
            });
        }

        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_retries".into(),
                reason: format!("must not exceed {MAX_RETRIES_LIMIT}"),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.soft_revalidate_secs >= self.hard_expiry_secs {
            return Err(ConfigError::Invalid {
                field: "soft_revalidate_secs".into(),
                reason: "must be less than hard_expiry_secs".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [("base_url", &self.base_url), ("probe_url", &self.probe_url)] {
            if let Err(e) = url::Url::parse(value) {
                return Err(ConfigError::Invalid { field: field.into(), reason: e.to_string() });
            }
        }

        if self.max_retries > 0 && self.max_delay_ms.saturating_mul(self.max_retries as u64) > 300_000 {
            tracing::warn!(
                max_retries = self.max_retries,
                max_delay_ms = self.max_delay_ms,
                "worst-case retry wait exceeds 5 minutes; bound requests externally"
            );
        }

        Ok(())
    }
}
