//! Fetch error taxonomy.

use std::fmt;

/// Why a request produced no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The attempt exceeded its timeout.
    Timeout,
    /// Connection could not be established (refused, unreachable).
    Connect,
    /// Connection dropped while sending or reading the body.
    Reset,
    /// Host name could not be resolved.
    Dns,
    /// Anything else (redirect loops, invalid request construction).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Reset => "reset",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the retry fetch client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// No response was received.
    #[error("transport error ({kind}): {message}")]
    Transport { kind: TransportErrorKind, message: String },

    /// A response was received but its status is not a success.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// The body could not be parsed per its declared content type.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request could not be built (bad URL, bad header value).
    #[error("invalid request: {0}")]
    Build(String),
}

impl FetchError {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        FetchError::Transport { kind, message: message.into() }
    }

    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a transient transport failure worth retrying.
    pub fn is_transient_transport(&self) -> bool {
        matches!(self, FetchError::Transport { kind, .. } if *kind != TransportErrorKind::Other)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return FetchError::Build(err.to_string());
        }
        if err.is_decode() {
            return FetchError::Decode(err.to_string());
        }

        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            if mentions_name_resolution(&err) { TransportErrorKind::Dns } else { TransportErrorKind::Connect }
        } else if err.is_body() || err.is_request() {
            TransportErrorKind::Reset
        } else {
            TransportErrorKind::Other
        };

        FetchError::Transport { kind, message: err.to_string() }
    }
}

/// reqwest folds resolver failures into connect errors; the cause chain says which.
fn mentions_name_resolution(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup") || text.contains("name resolution") {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::transport(TransportErrorKind::Timeout, "deadline elapsed");
        assert_eq!(err.to_string(), "transport error (timeout): deadline elapsed");

        let err = FetchError::Http { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_status_only_for_http() {
        assert_eq!(FetchError::Http { status: 404 }.status(), Some(404));
        assert_eq!(FetchError::Decode("bad".into()).status(), None);
    }

    #[test]
    fn test_transient_transport() {
        assert!(FetchError::transport(TransportErrorKind::Dns, "x").is_transient_transport());
        assert!(FetchError::transport(TransportErrorKind::Reset, "x").is_transient_transport());
        assert!(!FetchError::transport(TransportErrorKind::Other, "x").is_transient_transport());
        assert!(!FetchError::Http { status: 500 }.is_transient_transport());
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_name_resolution_found_in_cause_chain() {
        let err = Wrapped(std::io::Error::other("dns error: failed to lookup address information"));
        assert!(mentions_name_resolution(&err));

        let err = Wrapped(std::io::Error::other("connection refused"));
        assert!(!mentions_name_resolution(&err));
    }
}
