//! Reachability probing and connectivity listeners.
//!
//! A [`Reachability`] answers "can we reach the network right now?".
//! [`ConnectivityMonitor`] remembers the last answer and tells subscribers when
//! it flips. Subscriptions are RAII handles: dropping one (or calling
//! [`Subscription::unsubscribe`], any number of times) removes the listener.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::fetch::FetchError;

/// Cheap check against a known-reachable endpoint.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probes with a HEAD request; any HTTP response counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpReachability {
    http: Client,
    probe_url: Url,
}

impl HttpReachability {
    pub fn new(probe_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| FetchError::Build(format!("failed to build probe client: {}", e)))?;
        Ok(Self { http, probe_url })
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn is_reachable(&self) -> bool {
        match self.http.head(self.probe_url.clone()).send().await {
            Ok(response) => {
                tracing::debug!("reachability probe {} -> {}", self.probe_url, response.status());
                true
            }
            Err(e) => {
                tracing::debug!("reachability probe {} failed: {}", self.probe_url, e);
                false
            }
        }
    }
}

/// Reachability fixed by the caller, for tests and manual offline mode.
#[derive(Debug)]
pub struct StaticReachability {
    online: AtomicBool,
}

impl StaticReachability {
    pub fn new(online: bool) -> Self {
        Self { online: AtomicBool::new(online) }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Reachability for StaticReachability {
    async fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct MonitorState {
    last: Option<bool>,
    next_id: u64,
    listeners: HashMap<u64, Listener>,
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last-known connectivity plus change listeners.
///
/// Clones share state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    probe: Arc<dyn Reachability>,
    state: Arc<Mutex<MonitorState>>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn Reachability>) -> Self {
        Self { probe, state: Arc::default() }
    }

    /// Probe now, record the result, and notify listeners if it changed.
    pub async fn check(&self) -> bool {
        let online = self.probe.is_reachable().await;
        self.record(online);
        online
    }

    /// Result of the most recent probe, if any.
    pub fn last_known(&self) -> Option<bool> {
        lock(&self.state).last
    }

    /// Register a listener called with the new state on every change.
    pub fn subscribe(&self, listener: impl Fn(bool) + Send + Sync + 'static) -> Subscription {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, Arc::new(listener));
        Subscription { id, state: Arc::downgrade(&self.state), active: AtomicBool::new(true) }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    /// Forget the last state and drop every listener.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.last = None;
        state.listeners.clear();
    }

    fn record(&self, online: bool) {
        let listeners: Vec<Listener> = {
            let mut state = lock(&self.state);
            if state.last == Some(online) {
                return;
            }
            state.last = Some(online);
            state.listeners.values().cloned().collect()
        };

        tracing::info!(online, "connectivity changed");
        for listener in listeners {
            listener(online);
        }
    }
}

/// Handle for a connectivity listener.
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<MonitorState>>,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.state.upgrade() {
            lock(&state).listeners.remove(&self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn monitor(online: bool) -> (ConnectivityMonitor, Arc<StaticReachability>) {
        let probe = Arc::new(StaticReachability::new(online));
        (ConnectivityMonitor::new(probe.clone()), probe)
    }

    #[tokio::test]
    async fn test_listeners_fire_on_change_only() {
        let (monitor, probe) = monitor(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = monitor.subscribe(move |online| sink.lock().unwrap().push(online));

        assert!(monitor.check().await);
        assert!(monitor.check().await);
        probe.set_online(false);
        assert!(!monitor.check().await);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert_eq!(monitor.last_known(), Some(false));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let (monitor, probe) = monitor(true);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sub = monitor.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let _other = monitor.subscribe(|_| {});
        assert_eq!(monitor.listener_count(), 2);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(monitor.listener_count(), 1);

        probe.set_online(false);
        monitor.check().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        drop(sub);
        assert_eq!(monitor.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let (monitor, _) = monitor(true);
        {
            let _sub = monitor.subscribe(|_| {});
            assert_eq!(monitor.listener_count(), 1);
        }
        assert_eq!(monitor.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let (monitor, _) = monitor(true);
        let sub = monitor.subscribe(|_| {});
        monitor.check().await;

        monitor.reset();
        assert_eq!(monitor.last_known(), None);
        assert_eq!(monitor.listener_count(), 0);
        sub.unsubscribe();
    }

    #[test]
    fn test_subscription_outlives_monitor() {
        let (monitor, _) = monitor(true);
        let sub = monitor.subscribe(|_| {});
        drop(monitor);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn test_http_reachability_new() {
        let url = Url::parse("https://example.com/generate_204").unwrap();
        assert!(HttpReachability::new(url, Duration::from_secs(1)).is_ok());
    }
}
