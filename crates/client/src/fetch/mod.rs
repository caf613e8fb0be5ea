//! HTTP fetch with classified, backed-off retries.
//!
//! ### Attempt loop
//! - Send the request; a non-success status becomes [`FetchError::Http`]
//! - Success: decode the body by content type and return immediately
//! - Failure: classify, back off, and try again while the policy allows
//! - At most `max_retries + 1` physical requests per call
//!
//! ### Decoding
//! - `application/json` and `*+json` → [`Body::Json`]
//! - `text/*` → [`Body::Text`]
//! - empty body → [`Body::Empty`]; anything else → [`Body::Bytes`]
//!
//! ### Telemetry
//! - One observation per logical request, emitted when the loop ends.

pub mod error;
pub mod transport;

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use reqwest::header::{self, HeaderMap};
use serde_json::Value;

pub use error::{FetchError, TransportErrorKind};
pub use transport::{HttpTransport, RawResponse, RequestDescriptor, Transport};

use crate::retry::{RetryOptions, Sleeper, TokioSleeper};
use crate::telemetry::{RequestMeta, Telemetry, TracingTelemetry};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Bytes(Bytes),
    Empty,
}

/// Successful response of a logical request.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Body,
}

impl FetchedResponse {
    /// The `ETag` response header, if present and valid UTF-8.
    pub fn etag(&self) -> Option<String> {
        self.headers
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }

    /// Consume the response, keeping only a JSON body.
    pub fn into_json(self) -> Option<Value> {
        match self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Fetch client that retries transient failures with exponential backoff.
#[derive(Clone)]
pub struct RetryClient {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    telemetry: Arc<dyn Telemetry>,
}

impl RetryClient {
    /// Create a client over `transport` with tokio sleeps and tracing telemetry.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, sleeper: Arc::new(TokioSleeper), telemetry: Arc::new(TracingTelemetry) }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Perform one logical request, retrying per `options`.
    ///
    /// `label` names the request in telemetry.
    pub async fn fetch(
        &self, label: &str, request: &RequestDescriptor, options: &RetryOptions,
    ) -> Result<FetchedResponse, FetchError> {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let mut retry_count: u32 = 0;

        let result = loop {
            let error = match self.attempt(request).await {
                Ok(response) => break Ok(response),
                Err(e) => e,
            };

            if retry_count >= options.max_retries || !options.should_retry(&error, retry_count) {
                break Err(error);
            }

            retry_count += 1;
            let delay = options.delay_for(retry_count);
            tracing::debug!(label, retry_count, delay_ms = delay.as_millis() as u64, error = %error, "retrying request");

            if let Some(hook) = &options.on_retry {
                hook(retry_count, delay, &error);
            }
            self.sleeper.sleep(delay).await;
        };

        let meta = RequestMeta {
            retry_count,
            error: result.as_ref().err().map(ToString::to_string),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        self.telemetry.record(label, started_at, result.is_ok(), &meta);

        result
    }

    async fn attempt(&self, request: &RequestDescriptor) -> Result<FetchedResponse, FetchError> {
        let raw = self.transport.send(request).await?;

        let accepted = (200..300).contains(&raw.status) || (raw.status == 304 && request.is_conditional());
        if !accepted {
            return Err(FetchError::Http { status: raw.status });
        }

        let body = decode_body(&raw.headers, raw.body)?;
        Ok(FetchedResponse { status: raw.status, headers: raw.headers, body })
    }
}

/// Decode a body according to its declared content type.
pub fn decode_body(headers: &HeaderMap, bytes: Bytes) -> Result<Body, FetchError> {
    if bytes.is_empty() {
        return Ok(Body::Empty);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "application/json" || content_type.ends_with("+json") {
        serde_json::from_slice(&bytes)
            .map(Body::Json)
            .map_err(|e| FetchError::Decode(e.to_string()))
    } else if content_type.starts_with("text/") {
        String::from_utf8(bytes.to_vec())
            .map(Body::Text)
            .map_err(|e| FetchError::Decode(e.to_string()))
    } else {
        Ok(Body::Bytes(bytes))
    }
}
