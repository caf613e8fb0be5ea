//! Offline-first document retrieval.
//!
//! For each call:
//!
//! 1. Probe reachability.
//! 2. Decide whether the cached copy needs revalidation.
//! 3. If online and stale, fetch conditionally (`If-None-Match`):
//!    - 304: keep the cached copy, reset its staleness clock
//!    - data: delta-merge into the cached copy (or store it) and return it
//!    - failure: fall through to the cache
//! 4. Serve the cached copy; tell the user when that is because we're offline.
//!
//! Never fails: every path yields a document or `None`, with at most one
//! fetch (itself possibly retried) per call. Overlapping calls for the same
//! id race on the final write; last writer wins.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tripsync_core::cache::merge_documents;
use tripsync_core::{CacheStore, PutOptions};

pub use http::HttpDocumentFetcher;

use crate::connectivity::ConnectivityMonitor;
use crate::fetch::FetchError;
use crate::notice::Notifier;

const OFFLINE_TITLE: &str = "Offline mode";
const OFFLINE_BODY: &str = "You're offline. Showing your saved itinerary.";
const NO_DATA_TITLE: &str = "No data available";
const NO_DATA_BODY: &str = "You're offline and this itinerary hasn't been saved on this device yet.";

/// Validators sent with a revalidation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
}

/// What the server said about a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub status: u16,
    pub data: Option<Value>,
    /// `ETag` response header, adopted as the cache validator when present.
    pub etag: Option<String>,
}

impl FetchOutcome {
    pub fn not_modified() -> Self {
        Self { status: 304, data: None, etag: None }
    }

    pub fn ok(data: Value, etag: Option<String>) -> Self {
        Self { status: 200, data: Some(data), etag }
    }
}

/// Fetches one document from the server.
///
/// Implementations must fail rather than hang on transport errors.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, id: &str, conditional: &ConditionalHeaders) -> Result<FetchOutcome, FetchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub force_refresh: bool,
}

/// Where the returned document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// New data from the server, merged and persisted.
    Network,
    /// Server confirmed the cached copy (304).
    Revalidated,
    /// Cached copy served while online (fresh, or revalidation failed).
    Cache,
    /// Cached copy served while offline.
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    pub document: Value,
    pub source: Source,
}

/// Composes reachability, the cache and a fetcher into offline-first reads.
#[derive(Clone)]
pub struct OfflineSync {
    cache: CacheStore,
    connectivity: ConnectivityMonitor,
    notifier: Arc<dyn Notifier>,
}

impl OfflineSync {
    pub fn new(cache: CacheStore, connectivity: ConnectivityMonitor, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, connectivity, notifier }
    }

    /// Get a document, revalidating against the server when needed.
    pub async fn get_itinerary_with_offline_support(
        &self, id: &str, fetcher: &dyn DocumentFetcher, options: SyncOptions,
    ) -> Option<Value> {
        self.get_with_source(id, fetcher, options).await.map(|r| r.document)
    }

    /// Like [`get_itinerary_with_offline_support`](Self::get_itinerary_with_offline_support),
    /// also reporting where the document came from.
    pub async fn get_with_source(
        &self, id: &str, fetcher: &dyn DocumentFetcher, options: SyncOptions,
    ) -> Option<SyncResult> {
        let reachable = self.connectivity.check().await;

        // Reading the document first lets hard-expired entries be evicted
        // before their metadata is consulted.
        let cached = self.cache.get(id).await;
        let metadata = self.cache.get_metadata(id).await;
        let should_revalidate =
            self.cache
                .policy()
                .needs_revalidation(metadata.as_ref(), options.force_refresh, self.cache.now_millis());

        if reachable && should_revalidate {
            let conditional = ConditionalHeaders {
                if_none_match: cached.as_ref().and(metadata.as_ref()).and_then(|m| m.etag.clone()),
            };

            match fetcher.fetch(id, &conditional).await {
                Ok(outcome) if outcome.status == 304 => {
                    if let Some(document) = &cached {
                        self.cache.touch(id).await;
                        tracing::debug!(id, "cached document confirmed by server");
                        return Some(SyncResult { document: document.clone(), source: Source::Revalidated });
                    }
                    tracing::warn!(id, "server answered 304 but nothing is cached");
                }
                Ok(FetchOutcome { data: Some(data), etag, .. }) => {
                    let document = self.apply_update(id, cached.as_ref(), data, etag).await;
                    return Some(SyncResult { document, source: Source::Network });
                }
                Ok(outcome) => {
                    tracing::debug!(id, status = outcome.status, "revalidation returned no data");
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "revalidation failed, serving cache");
                }
            }
        }

        match cached {
            Some(document) => {
                let source = if reachable {
                    Source::Cache
                } else {
                    self.notifier.notify(OFFLINE_TITLE, OFFLINE_BODY);
                    Source::Offline
                };
                Some(SyncResult { document, source })
            }
            None => {
                if !reachable {
                    self.notifier.notify(NO_DATA_TITLE, NO_DATA_BODY);
                }
                None
            }
        }
    }

    /// Fold fresh server data into the cache and return the resulting document.
    async fn apply_update(&self, id: &str, cached: Option<&Value>, data: Value, etag: Option<String>) -> Value {
        let document = match cached {
            Some(old) => match merge_documents(old, &data) {
                Ok(outcome) => {
                    tracing::debug!(id, changed = outcome.changed_paths.len(), "merged server update");
                    outcome.merged
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "merge failed, replacing cached document");
                    data
                }
            },
            None => data,
        };

        if !self.cache.put(id, &document, PutOptions::complete(etag)).await {
            tracing::warn!(id, "server update not persisted, returning it uncached");
        }
        document
    }
}
