//! Cache statistics and expiry sweep.

use serde::Serialize;

use super::store::CacheStore;
use crate::Error;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Derived, read-only view over the cache contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub count: usize,
    /// Sum of serialized document lengths in bytes.
    pub total_size_bytes: usize,
    pub oldest_timestamp: Option<i64>,
    pub newest_timestamp: Option<i64>,
    pub oldest_age_days: Option<f64>,
}

impl CacheStore {
    /// Summarize every cached document.
    pub async fn stats(&self) -> CacheStats {
        self.try_stats().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to compute cache stats");
            CacheStats::default()
        })
    }

    /// Evict every entry past hard expiry, returning how many were removed.
    ///
    /// Intended to run periodically; scheduling is left to the caller.
    pub async fn cleanup(&self) -> usize {
        let now = self.now_millis();
        let mut removed = 0;

        for id in self.list().await {
            let expired = match self.read_metadata(&id).await {
                Ok(Some(meta)) => self.policy().is_hard_expired(&meta, now),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(id, error = %e, "skipping entry during cleanup");
                    false
                }
            };
            if expired && self.remove(&id).await {
                removed += 1;
            }
        }

        tracing::info!(removed, "cache cleanup finished");
        removed
    }

    async fn try_stats(&self) -> Result<CacheStats, Error> {
        let mut stats = CacheStats::default();

        for id in self.try_list().await? {
            let Some(meta) = self.read_metadata(&id).await? else {
                continue;
            };
            stats.count += 1;
            stats.total_size_bytes += self.read_raw(&id).await?.map_or(0, |raw| raw.len());
            stats.oldest_timestamp = Some(stats.oldest_timestamp.map_or(meta.timestamp, |t| t.min(meta.timestamp)));
            stats.newest_timestamp = Some(stats.newest_timestamp.map_or(meta.timestamp, |t| t.max(meta.timestamp)));
        }

        stats.oldest_age_days = stats
            .oldest_timestamp
            .map(|oldest| (self.now_millis() - oldest).max(0) as f64 / MILLIS_PER_DAY);

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::policy::HARD_EXPIRY;
    use crate::cache::store::PutOptions;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn cache() -> (CacheStore, ManualClock) {
        let clock = ManualClock::new(0);
        let cache = CacheStore::new(Arc::new(MemoryStore::new())).with_clock(Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let (cache, _) = cache();
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_stats_aggregates() {
        let (cache, clock) = cache();
        cache.put("a", &json!({"x": 1}), PutOptions::default()).await;
        clock.advance(Duration::from_secs(86_400));
        cache.put("b", &json!([1, 2, 3]), PutOptions::default()).await;
        clock.advance(Duration::from_secs(86_400));

        let stats = cache.stats().await;
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_size_bytes, r#"{"x":1}"#.len() + "[1,2,3]".len());
        assert_eq!(stats.oldest_timestamp, Some(0));
        assert_eq!(stats.newest_timestamp, Some(86_400_000));
        assert_eq!(stats.oldest_age_days, Some(2.0));
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let (cache, clock) = cache();
        cache.put("old", &json!(1), PutOptions::default()).await;
        clock.advance(HARD_EXPIRY);
        cache.put("new", &json!(2), PutOptions::default()).await;
        clock.advance(Duration::from_secs(60));

        assert_eq!(cache.cleanup().await, 1);
        assert_eq!(cache.list().await, vec!["new".to_string()]);
        assert_eq!(cache.cleanup().await, 0);
    }
}
