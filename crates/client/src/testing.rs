//! Test doubles shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, ETAG, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::fetch::{FetchError, RawResponse, RequestDescriptor, Transport};
use crate::notice::Notifier;
use crate::offline::{ConditionalHeaders, DocumentFetcher, FetchOutcome};
use crate::retry::Sleeper;
use crate::telemetry::{RequestMeta, Telemetry};

pub fn status_response(status: u16) -> RawResponse {
    RawResponse { status, headers: HeaderMap::new(), body: Bytes::new() }
}

pub fn json_response(status: u16, value: Value, etag: Option<&str>) -> RawResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(etag) = etag {
        headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
    }
    RawResponse { status, headers, body: Bytes::from(serde_json::to_vec(&value).unwrap()) }
}

/// Replays scripted results; the last one repeats once the script runs out.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, FetchError>>>,
    last: Mutex<Option<Result<RawResponse, FetchError>>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedTransport {
    pub fn sequence(results: Vec<Result<RawResponse, FetchError>>) -> Self {
        Self { script: Mutex::new(results.into()), last: Mutex::new(None), requests: Mutex::new(Vec::new()) }
    }

    pub fn always(result: Result<RawResponse, FetchError>) -> Self {
        Self::sequence(vec![result])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone().expect("scripted transport has no results")
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryRecord {
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    pub meta: RequestMeta,
}

#[derive(Default)]
pub struct RecordingTelemetry {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl RecordingTelemetry {
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, label: &str, started_at: DateTime<Utc>, success: bool, meta: &RequestMeta) {
        self.records.lock().unwrap().push(TelemetryRecord {
            label: label.to_string(),
            started_at,
            success,
            meta: meta.clone(),
        });
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.notices.lock().unwrap().push((title.to_string(), body.to_string()));
    }
}

/// Document fetcher returning a fixed outcome and counting calls.
pub struct CountingFetcher {
    outcome: Result<FetchOutcome, FetchError>,
    calls: AtomicUsize,
    conditionals: Mutex<Vec<ConditionalHeaders>>,
}

impl CountingFetcher {
    pub fn new(outcome: Result<FetchOutcome, FetchError>) -> Self {
        Self { outcome, calls: AtomicUsize::new(0), conditionals: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn conditionals(&self) -> Vec<ConditionalHeaders> {
        self.conditionals.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for CountingFetcher {
    async fn fetch(&self, _id: &str, conditional: &ConditionalHeaders) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.conditionals.lock().unwrap().push(conditional.clone());
        self.outcome.clone()
    }
}
