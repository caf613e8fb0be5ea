//! Request telemetry collaborator.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-request details attached to a telemetry observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    /// Retries performed (attempts minus one).
    pub retry_count: u32,
    /// Final error, when the request failed.
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Receives exactly one observation per logical request.
///
/// Fire-and-forget: implementations must not block.
pub trait Telemetry: Send + Sync {
    fn record(&self, label: &str, started_at: DateTime<Utc>, success: bool, meta: &RequestMeta);
}

/// Emits observations as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, label: &str, started_at: DateTime<Utc>, success: bool, meta: &RequestMeta) {
        tracing::info!(
            target: "tripsync::telemetry",
            label,
            started_at = %started_at.to_rfc3339(),
            success,
            retry_count = meta.retry_count,
            elapsed_ms = meta.elapsed_ms,
            error = ?meta.error,
            "request finished"
        );
    }
}
