//! Retry policy: backoff, classification and the delay primitive.
//!
//! ### Defaults
//! - 3 retries after the first attempt
//! - 1s base delay doubling per retry, capped at 30s
//! - ±20% jitter
//! - transport failures, 5xx and 429 are retried; other 4xx are not

pub mod backoff;
pub mod classify;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tripsync_core::SyncConfig;

pub use backoff::{backoff_delay, backoff_delay_with};
pub use classify::should_retry;

use crate::fetch::FetchError;

/// Custom retry decision: `(error, retry_count, max_retries) -> retry?`.
///
/// Replaces the default table entirely. The attempt cap still applies.
pub type RetryPredicate = Arc<dyn Fn(&FetchError, u32, u32) -> bool + Send + Sync>;

/// Side-effect hook run before each backoff wait: `(retry_count, delay, error)`.
pub type RetryHook = Arc<dyn Fn(u32, Duration, &FetchError) + Send + Sync>;

/// Retry configuration for one logical request.
#[derive(Clone)]
pub struct RetryOptions {
    /// Retries after the first attempt; at most `max_retries + 1` requests are sent.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Relative jitter, clamped to 0.0..=1.0.
    pub jitter_factor: f64,
    pub retry_predicate: Option<RetryPredicate>,
    pub on_retry: Option<RetryHook>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            jitter_factor: 0.2,
            retry_predicate: None,
            on_retry: None,
        }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter_factor", &self.jitter_factor)
            .field("retry_predicate", &self.retry_predicate.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryOptions {
    /// Options from the loaded configuration.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            jitter_factor: config.jitter_factor,
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_predicate(mut self, predicate: impl Fn(&FetchError, u32, u32) -> bool + Send + Sync + 'static) -> Self {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn with_on_retry(mut self, hook: impl Fn(u32, Duration, &FetchError) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Whether a failure after `retry_count` retries should be retried.
    pub fn should_retry(&self, error: &FetchError, retry_count: u32) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error, retry_count, self.max_retries),
            None => should_retry(error, retry_count, self.max_retries),
        }
    }

    /// Backoff before retry number `retry_count` (1-based).
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        backoff_delay(retry_count, self.base_delay, self.max_delay, self.jitter_factor)
    }
}

/// Suspends the current request between attempts.
///
/// Injected so tests can record delays instead of waiting them out.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
