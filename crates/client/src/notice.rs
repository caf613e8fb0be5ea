//! User-visible notices.

/// Shows a short message to the user.
///
/// Invoked only when the device is offline: once when serving cached data and
/// once when there is nothing to serve.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Logs notices instead of displaying them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::warn!(target: "tripsync::notice", title, body, "user notice");
    }
}
