//! Per-document cache metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bookkeeping stored alongside every cached document.
///
/// `version` starts at 1 on first persist and goes up by exactly one on every
/// persisted write. `timestamp` is the time of the latest persisted change,
/// or of the latest 304 confirmation from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// Unix milliseconds of the most recent change or confirmation.
    pub timestamp: i64,
    pub version: u64,
    /// Dotted path -> Unix milliseconds of local partial edits.
    #[serde(default)]
    pub partial_updates: BTreeMap<String, i64>,
    pub etag: Option<String>,
    /// `false` marks a known-partial document that must always revalidate.
    pub is_complete: bool,
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self { timestamp: 0, version: 0, partial_updates: BTreeMap::new(), etag: None, is_complete: true }
    }
}

impl CacheMetadata {
    /// Milliseconds elapsed since `timestamp`, never negative.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        (now_millis - self.timestamp).max(0)
    }
}
