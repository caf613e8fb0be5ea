//! Process-scoped sync state.
//!
//! [`SyncSession`] wires the store, retry client, connectivity monitor,
//! telemetry and notifier together once, so callers only deal with ids.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tripsync_core::config::ConfigError;
use tripsync_core::{CacheStats, CacheStore, KeyValueStore, SqliteStore, SyncConfig};

use crate::connectivity::{ConnectivityMonitor, HttpReachability, Reachability};
use crate::fetch::{FetchError, HttpTransport, RetryClient};
use crate::notice::{Notifier, TracingNotifier};
use crate::offline::{DocumentFetcher, HttpDocumentFetcher, OfflineSync, SyncOptions, SyncResult};
use crate::retry::RetryOptions;

/// Errors raised while assembling a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to open cache: {0}")]
    Store(#[from] tripsync_core::Error),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] FetchError),
}

/// Bundles everything needed to read and edit itineraries offline-first.
#[derive(Clone)]
pub struct SyncSession {
    cache: CacheStore,
    connectivity: ConnectivityMonitor,
    offline: OfflineSync,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl SyncSession {
    /// Open a session backed by SQLite and the HTTP API described by `config`.
    pub async fn open(config: &SyncConfig) -> Result<Self, SessionError> {
        config.validate()?;

        let base_url = parse_url("base_url", &config.base_url)?;
        let probe_url = parse_url("probe_url", &config.probe_url)?;

        let store = SqliteStore::open(&config.db_path).await?;
        let transport = HttpTransport::new(&config.user_agent, config.timeout())?;
        let probe = HttpReachability::new(probe_url, config.probe_timeout())?;

        let client = RetryClient::new(Arc::new(transport));
        let fetcher = HttpDocumentFetcher::new(client, base_url, RetryOptions::from_config(config));

        tracing::info!(db_path = %config.db_path.display(), base_url = %config.base_url, "sync session opened");

        Ok(Self::new(
            Arc::new(store),
            Arc::new(probe),
            Arc::new(fetcher),
            Arc::new(TracingNotifier),
            config,
        ))
    }

    /// Assemble a session from explicit collaborators.
    pub fn new(
        store: Arc<dyn KeyValueStore>, probe: Arc<dyn Reachability>, fetcher: Arc<dyn DocumentFetcher>,
        notifier: Arc<dyn Notifier>, config: &SyncConfig,
    ) -> Self {
        let cache = CacheStore::new(store).with_policy(config.revalidation_policy());
        Self::from_parts(cache, ConnectivityMonitor::new(probe), fetcher, notifier)
    }

    /// Assemble a session around an existing cache.
    pub fn from_parts(
        cache: CacheStore, connectivity: ConnectivityMonitor, fetcher: Arc<dyn DocumentFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let offline = OfflineSync::new(cache.clone(), connectivity.clone(), notifier);
        Self { cache, connectivity, offline, fetcher }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn offline(&self) -> &OfflineSync {
        &self.offline
    }

    pub fn document_fetcher(&self) -> &dyn DocumentFetcher {
        self.fetcher.as_ref()
    }

    /// Offline-first read of one itinerary.
    pub async fn get_itinerary(&self, id: &str, force_refresh: bool) -> Option<SyncResult> {
        self.offline
            .get_with_source(id, self.fetcher.as_ref(), SyncOptions { force_refresh })
            .await
    }

    /// Apply a local edit at a dotted path. Returns `false` if nothing was written.
    pub async fn update_cached_itinerary_part(&self, id: &str, path: &str, value: Value) -> bool {
        self.cache.update_part(id, path, value).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Evict hard-expired entries, returning how many were removed.
    pub async fn cleanup(&self) -> usize {
        self.cache.cleanup().await
    }

    /// Clear the cache and drop connectivity listeners.
    pub async fn reset(&self) -> bool {
        self.connectivity.reset();
        self.cache.clear().await
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SessionError> {
    Url::parse(raw).map_err(|source| SessionError::InvalidUrl { field, source })
}
