//! Failure classification and backoff policy.
//!
//! Pure functions only: the classifier knows nothing about the circuit
//! breaker or the token bucket, so retry decisions stay independently
//! testable.

use crate::client::types::ApiError;
use std::time::Duration;

/// Decide whether a failed attempt is worth retrying.
///
/// Retryable: HTTP 429, any 5xx, and network-level failures (timeouts,
/// connection resets). Everything else signals a client-side problem that
/// retrying cannot fix.
pub fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Status { status, .. } => *status == 429 || *status >= 500,
        ApiError::Network(_) => true,
        _ => false,
    }
}

/// Backoff delay before retry `attempt` (0-indexed): `base × 2^attempt`.
///
/// There is no delay before the first attempt; the first retry waits `base`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> ApiError {
        ApiError::Status {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable(&status_error(status)), "{status} should retry");
        }
    }

    #[test]
    fn test_fatal_statuses() {
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(!is_retryable(&status_error(status)), "{status} is fatal");
        }
    }

    #[test]
    fn test_network_errors_retryable() {
        assert!(is_retryable(&ApiError::Network(
            "connection reset by peer".to_string()
        )));
        assert!(is_retryable(&ApiError::Network("upstream timeout".to_string())));
    }

    #[test]
    fn test_non_transport_errors_fatal() {
        assert!(!is_retryable(&ApiError::CircuitOpen {
            service: "shopify".to_string()
        }));
        assert!(!is_retryable(&ApiError::Timeout {
            waited: Duration::from_secs(1)
        }));
        assert!(!is_retryable(&ApiError::InvalidRequest("bad path".to_string())));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_saturates() {
        let base = Duration::from_secs(1);
        // Absurd attempt counts must not panic, just clamp
        let delay = backoff_delay(base, 200);
        assert!(delay >= backoff_delay(base, 32));
    }
}
