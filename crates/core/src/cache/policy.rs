//! Staleness rules for cached documents.

use std::time::Duration;

use super::metadata::CacheMetadata;

/// Age past which a cached document should be refreshed when online (30 minutes).
pub const SOFT_REVALIDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Age past which a cached document is discarded outright (7 days).
pub const HARD_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Soft and hard staleness thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    pub soft_interval: Duration,
    pub hard_expiry: Duration,
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self { soft_interval: SOFT_REVALIDATE_INTERVAL, hard_expiry: HARD_EXPIRY }
    }
}

impl RevalidationPolicy {
    pub fn new(soft_interval: Duration, hard_expiry: Duration) -> Self {
        Self { soft_interval, hard_expiry }
    }

    /// Whether the document behind `metadata` must be re-fetched.
    ///
    /// True when there is no metadata, a refresh is forced, the entry is past
    /// either threshold, or it is marked incomplete.
    pub fn needs_revalidation(&self, metadata: Option<&CacheMetadata>, force_refresh: bool, now_millis: i64) -> bool {
        let Some(meta) = metadata else {
            return true;
        };
        if force_refresh || !meta.is_complete {
            return true;
        }
        let age = meta.age_millis(now_millis);
        age > millis(self.hard_expiry) || age > millis(self.soft_interval)
    }

    /// Whether the entry is past hard expiry and should be evicted.
    pub fn is_hard_expired(&self, metadata: &CacheMetadata, now_millis: i64) -> bool {
        metadata.age_millis(now_millis) > millis(self.hard_expiry)
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
