//! Core types and shared functionality for tripsync.
//!
//! This crate provides:
//! - Versioned document cache with SQLite and in-memory backends
//! - Structural delta merge and path-based partial updates
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;

pub use cache::{CacheMetadata, CacheStats, CacheStore, PutOptions, RevalidationPolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SyncConfig;
pub use error::Error;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
