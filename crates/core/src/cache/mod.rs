//! Offline document cache.
//!
//! Versioned itinerary documents with per-document metadata, layered over a
//! [`KeyValueStore`](crate::store::KeyValueStore). It supports:
//!
//! - Monotonic per-document versions and ETag tracking
//! - Soft (revalidate) and hard (evict) staleness thresholds
//! - Structural delta merge of server updates
//! - Dotted-path local edits with an audit trail
//! - Stats and an expiry sweep

pub mod maintenance;
pub mod merge;
pub mod metadata;
pub mod partial;
pub mod policy;
pub mod store;

pub use maintenance::CacheStats;
pub use merge::{MAX_MERGE_DEPTH, MergeOutcome, merge_documents};
pub use metadata::CacheMetadata;
pub use partial::set_at_path;
pub use policy::{HARD_EXPIRY, RevalidationPolicy, SOFT_REVALIDATE_INTERVAL};
pub use store::{CacheStore, PutOptions};
