//! Persistent key/value collaborator.
//!
//! The cache layer only ever needs string keys and string values, one key at
//! a time. Two backends are provided:
//!
//! - [`SqliteStore`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//! - [`MemoryStore`]: in-process map for tests and throwaway sessions

pub mod connection;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;

use crate::Error;

pub use connection::SqliteStore;
pub use memory::MemoryStore;

/// String-keyed persistent store.
///
/// Implementations provide per-key atomicity only; no multi-key transactions
/// are assumed by callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Delete a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}
