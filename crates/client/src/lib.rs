//! Client code for tripsync.
//!
//! This crate provides the retrying HTTP fetch pipeline, connectivity probing,
//! and the offline-first orchestrator built on the core cache.

pub mod connectivity;
pub mod fetch;
pub mod notice;
pub mod offline;
pub mod retry;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use connectivity::{ConnectivityMonitor, HttpReachability, Reachability, StaticReachability, Subscription};
pub use fetch::{Body, FetchError, FetchedResponse, HttpTransport, RequestDescriptor, RetryClient, TransportErrorKind};
pub use notice::{Notifier, TracingNotifier};
pub use offline::{
    ConditionalHeaders, DocumentFetcher, FetchOutcome, HttpDocumentFetcher, OfflineSync, Source, SyncOptions,
    SyncResult,
};
pub use retry::{RetryOptions, backoff_delay, should_retry};
pub use session::{SessionError, SyncSession};
pub use telemetry::{RequestMeta, Telemetry, TracingTelemetry};
