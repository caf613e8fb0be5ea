//! Document cache on top of a [`KeyValueStore`].
//!
//! Layout in the underlying store:
//!
//! - `itinerary:<id>`: document JSON
//! - `itinerary_meta:<id>`: [`CacheMetadata`] JSON
//! - `itinerary_index`: JSON array of cached ids
//!
//! Public operations never propagate store errors. A failing store reads as a
//! cache miss and a failing write reports `false`, so callers must not assume
//! durability.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use super::metadata::CacheMetadata;
use super::policy::RevalidationPolicy;
use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::store::KeyValueStore;

const DOC_PREFIX: &str = "itinerary:";
const META_PREFIX: &str = "itinerary_meta:";
const INDEX_KEY: &str = "itinerary_index";

/// Optional metadata to apply on a write.
///
/// Fields left as `None` keep their previous value.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub etag: Option<String>,
    pub is_complete: Option<bool>,
}

impl PutOptions {
    /// Options for a complete document confirmed by the server.
    pub fn complete(etag: Option<String>) -> Self {
        Self { etag, is_complete: Some(true) }
    }
}

/// Versioned document cache.
///
/// Cheap to clone; clones share the backing store and index lock.
#[derive(Clone)]
pub struct CacheStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: RevalidationPolicy,
    // Serializes read-modify-write of the shared index key only.
    index_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("clock", &self.clock)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Create a cache over `kv` using the system clock and default thresholds.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv, clock: Arc::new(SystemClock), policy: RevalidationPolicy::default(), index_lock: Arc::default() }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: RevalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RevalidationPolicy {
        &self.policy
    }

    /// Current time according to the cache clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Store a document, bumping its version and timestamp.
    ///
    /// Returns `false` if the write failed.
    pub async fn put(&self, id: &str, document: &Value, options: PutOptions) -> bool {
        match self.write(id, document, options, None).await {
            Ok(meta) => {
                tracing::debug!(id, version = meta.version, "cached document");
                true
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to cache document");
                false
            }
        }
    }

    /// Load a cached document.
    ///
    /// Entries past hard expiry are evicted and read as absent.
    pub async fn get(&self, id: &str) -> Option<Value> {
        self.try_get(id).await.unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "cache read failed, treating as miss");
            None
        })
    }

    /// Load metadata for a cached document.
    pub async fn get_metadata(&self, id: &str) -> Option<CacheMetadata> {
        self.read_metadata(id).await.unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "metadata read failed, treating as miss");
            None
        })
    }

    /// Reset the staleness clock of an entry without changing its version.
    ///
    /// Used when the server confirms the cached copy is current.
    pub async fn touch(&self, id: &str) -> bool {
        let result = async {
            let Some(mut meta) = self.read_metadata(id).await? else {
                return Err(Error::CacheMiss(id.to_string()));
            };
            meta.timestamp = self.clock.now_millis();
            self.kv.set(&meta_key(id), &serde_json::to_string(&meta)?).await
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to refresh cache timestamp");
                false
            }
        }
    }

    /// Delete a document, its metadata, and its index entry.
    pub async fn remove(&self, id: &str) -> bool {
        match self.try_remove(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to remove cached document");
                false
            }
        }
    }

    /// Ids currently cached.
    ///
    /// Ids whose metadata has gone missing are dropped from the index.
    pub async fn list(&self) -> Vec<String> {
        self.try_list().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list cache index");
            Vec::new()
        })
    }

    /// Remove every cached document.
    pub async fn clear(&self) -> bool {
        let result = async {
            let _guard = self.index_lock.lock().await;
            for id in self.read_index().await? {
                self.kv.remove(&doc_key(&id)).await?;
                self.kv.remove(&meta_key(&id)).await?;
            }
            self.kv.remove(INDEX_KEY).await
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to clear cache");
                false
            }
        }
    }

    pub(crate) async fn try_get(&self, id: &str) -> Result<Option<Value>, Error> {
        let meta = self.read_metadata(id).await?;
        if let Some(meta) = &meta
            && self.policy.is_hard_expired(meta, self.clock.now_millis())
        {
            tracing::info!(id, version = meta.version, "evicting hard-expired document");
            self.try_remove(id).await?;
            return Ok(None);
        }

        let Some(raw) = self.kv.get(&doc_key(id)).await? else {
            return Ok(None);
        };
        if meta.is_none() {
            tracing::warn!(id, "dropping document without metadata");
            self.kv.remove(&doc_key(id)).await?;
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Raw serialized document, for size accounting.
    pub(crate) async fn read_raw(&self, id: &str) -> Result<Option<String>, Error> {
        self.kv.get(&doc_key(id)).await
    }

    pub(crate) async fn read_metadata(&self, id: &str) -> Result<Option<CacheMetadata>, Error> {
        match self.kv.get(&meta_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persist a document and its bumped metadata.
    ///
    /// `partial_path` records a local edit in `partial_updates`.
    pub(crate) async fn write(
        &self, id: &str, document: &Value, options: PutOptions, partial_path: Option<&str>,
    ) -> Result<CacheMetadata, Error> {
        let serialized = serde_json::to_string(document)?;
        let now = self.clock.now_millis();

        let previous_meta = self.kv.get(&meta_key(id)).await?;
        let previous_doc = self.read_raw(id).await?;

        let mut meta: CacheMetadata = match &previous_meta {
            Some(raw) => serde_json::from_str(raw)?,
            None => CacheMetadata::default(),
        };
        meta.version += 1;
        meta.timestamp = now;
        if let Some(etag) = options.etag {
            meta.etag = Some(etag);
        }
        if let Some(is_complete) = options.is_complete {
            meta.is_complete = is_complete;
        }
        if let Some(path) = partial_path {
            meta.partial_updates.insert(path.to_string(), now);
        }

        let meta_json = serde_json::to_string(&meta)?;

        self.kv.set(&doc_key(id), &serialized).await?;
        if let Err(e) = self.kv.set(&meta_key(id), &meta_json).await {
            self.restore(id, &doc_key(id), previous_doc.as_deref()).await;
            return Err(e);
        }
        if let Err(e) = self.add_to_index(id).await {
            self.restore(id, &meta_key(id), previous_meta.as_deref()).await;
            self.restore(id, &doc_key(id), previous_doc.as_deref()).await;
            return Err(e);
        }

        Ok(meta)
    }

    /// Put `key` back to `previous`, or delete it if it did not exist.
    async fn restore(&self, id: &str, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(value) => self.kv.set(key, value).await,
            None => self.kv.remove(key).await,
        };
        if let Err(e) = result {
            tracing::warn!(id, key, error = %e, "failed to roll back partial write");
        }
    }

    pub(crate) async fn try_remove(&self, id: &str) -> Result<(), Error> {
        self.kv.remove(&doc_key(id)).await?;
        self.kv.remove(&meta_key(id)).await?;

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        let before = index.len();
        index.retain(|existing| existing != id);
        if index.len() != before {
            self.write_index(&index).await?;
        }
        Ok(())
    }

    pub(crate) async fn try_list(&self) -> Result<Vec<String>, Error> {
        let _guard = self.index_lock.lock().await;
        let index = self.read_index().await?;

        let mut live = Vec::with_capacity(index.len());
        for id in &index {
            if self.kv.get(&meta_key(id)).await?.is_some() {
                live.push(id.clone());
            }
        }
        if live.len() != index.len() {
            tracing::debug!(dropped = index.len() - live.len(), "pruned dangling index entries");
            self.write_index(&live).await?;
        }
        Ok(live)
    }

    async fn add_to_index(&self, id: &str) -> Result<(), Error> {
        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        if !index.iter().any(|existing| existing == id) {
            index.push(id.to_string());
            self.write_index(&index).await?;
        }
        Ok(())
    }

    async fn read_index(&self) -> Result<Vec<String>, Error> {
        match self.kv.get(INDEX_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_index(&self, index: &[String]) -> Result<(), Error> {
        self.kv.set(INDEX_KEY, &serde_json::to_string(index)?).await
    }
}

fn doc_key(id: &str) -> String {
    format!("{DOC_PREFIX}{id}")
}

fn meta_key(id: &str) -> String {
    format!("{META_PREFIX}{id}")
}
