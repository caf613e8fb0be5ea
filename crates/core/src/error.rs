//! Unified error types for tripsync.
//!
//! Cache operations mostly swallow these at their public boundary (a failing
//! store reads as a miss), but the lower layers report them precisely.

use tokio_rusqlite::rusqlite;

/// Unified error types for the sync core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A document or metadata record could not be (de)serialized.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),

    /// No cache entry found for the given document id.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// A dotted update path could not be applied to the document.
    #[error("INVALID_PATH: {0}")]
    InvalidPath(String),

    /// Document nesting exceeds the merge depth bound.
    #[error("MERGE_TOO_DEEP: nesting exceeds {0} levels")]
    MergeTooDeep(usize),

    /// In-memory store refused the operation (used for fault injection).
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
