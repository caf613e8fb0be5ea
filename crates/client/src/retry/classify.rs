//! Retry decision table.

use crate::fetch::FetchError;

/// Default retry classification.
///
/// In priority order: out of retries → no; transient transport failure → yes;
/// 5xx → yes; 429 → yes; other 4xx → no; anything else → no.
pub fn should_retry(error: &FetchError, retry_count: u32, max_retries: u32) -> bool {
    if retry_count >= max_retries {
        return false;
    }

    match error.status() {
        None => error.is_transient_transport(),
        Some(status) if (500..600).contains(&status) => true,
        Some(429) => true,
        Some(_) => false,
    }
}
