//! Exponential backoff with symmetric jitter.

use std::time::Duration;

/// Delay before retry number `retry_count` (1-based).
///
/// `floor(min(base * 2^retry_count, max) * (1 + jitter * (2r - 1)))` for a
/// uniform draw `r` in `[0, 1)`.
pub fn backoff_delay(retry_count: u32, base: Duration, max: Duration, jitter_factor: f64) -> Duration {
    backoff_delay_with(retry_count, base, max, jitter_factor, rand::random::<f64>())
}

/// [`backoff_delay`] with an explicit random draw.
pub fn backoff_delay_with(retry_count: u32, base: Duration, max: Duration, jitter_factor: f64, draw: f64) -> Duration {
    let base_ms = base.as_millis() as f64;
    let max_ms = max.as_millis() as f64;

    let exponential = base_ms * 2f64.powi(retry_count.min(64) as i32);
    let capped = exponential.min(max_ms);

    let jitter = jitter_factor.clamp(0.0, 1.0);
    let factor = 1.0 + jitter * (2.0 * draw.clamp(0.0, 1.0) - 1.0);

    Duration::from_millis((capped * factor).floor().max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(1_000);
    const MAX: Duration = Duration::from_millis(30_000);

    #[test]
    fn test_no_jitter_matches_capped_exponential() {
        for n in 1..=10u32 {
            let expected = (1_000u64 * 2u64.pow(n)).min(30_000);
            assert_eq!(backoff_delay(n, BASE, MAX, 0.0), Duration::from_millis(expected), "retry {n}");
        }
    }

    #[test]
    fn test_non_decreasing_before_cap() {
        let delays: Vec<_> = (1..=6).map(|n| backoff_delay_with(n, BASE, MAX, 0.2, 0.5)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_jitter_bounds() {
        let low = backoff_delay_with(10, BASE, MAX, 0.2, 0.0);
        let high = backoff_delay_with(10, BASE, MAX, 0.2, 0.999_999);
        assert_eq!(low, Duration::from_millis(24_000));
        assert_eq!(high, Duration::from_millis(35_999));

        for _ in 0..100 {
            let d = backoff_delay(3, BASE, MAX, 0.2);
            assert!(d >= Duration::from_millis(6_400) && d <= Duration::from_millis(9_600), "{d:?}");
        }
    }

    #[test]
    fn test_huge_retry_count_saturates_at_cap() {
        assert_eq!(backoff_delay(u32::MAX, BASE, MAX, 0.0), MAX);
    }
}
