//! Per-service circuit breaker.
//!
//! State machine: closed → open → half-open. Failures are counted within a
//! rolling monitoring window; reaching the threshold opens the circuit and
//! every call fails fast until the recovery timeout elapses, after which a
//! single trial call decides whether to close again.

use crate::client::types::{ApiError, CircuitBreakerConfig};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half_open"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: State,
    failure_count: u32,
    window_start: Instant,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    service: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(service: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            service: service.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: State::Closed,
                failure_count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Gate a call before any token is acquired or network attempt made.
    ///
    /// While open, the first check after the recovery timeout transitions to
    /// half-open and is admitted as the trial; all other half-open checks
    /// fail fast until the trial resolves via `record_success` or
    /// `record_failure`.
    pub fn check(&self) -> Result<(), ApiError> {
        let mut inner = self.lock();
        match inner.state {
            State::Closed => Ok(()),
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    inner.state = State::HalfOpen;
                    info!(service = %self.service, "circuit half-open, admitting trial request");
                    Ok(())
                } else {
                    Err(ApiError::CircuitOpen {
                        service: self.service.clone(),
                    })
                }
            }
            State::HalfOpen => Err(ApiError::CircuitOpen {
                service: self.service.clone(),
            }),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            State::Closed => {
                // Failures must be consecutive within the window to trip
                inner.failure_count = 0;
            }
            State::HalfOpen => {
                inner.state = State::Closed;
                inner.failure_count = 0;
                info!(service = %self.service, "circuit closed after successful trial");
            }
            State::Open { .. } => {}
        }
    }

    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.state {
            State::Closed => {
                if now.duration_since(inner.window_start) > self.config.monitoring_period {
                    inner.window_start = now;
                    inner.failure_count = 0;
                }
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = State::Open { opened_at: now };
                    warn!(
                        service = %self.service,
                        failures = inner.failure_count,
                        "circuit opened after repeated failures"
                    );
                }
            }
            State::HalfOpen => {
                inner.state = State::Open { opened_at: now };
                warn!(service = %self.service, "trial request failed, circuit re-opened");
            }
            State::Open { .. } => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.lock().state {
            State::Closed => CircuitState::Closed,
            State::Open { .. } => CircuitState::Open,
            State::HalfOpen => CircuitState::HalfOpen,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker(threshold: u32, recovery: Duration, window: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: recovery,
                monitoring_period: window,
            },
        )
    }

    #[test]
    fn test_starts_closed_and_passes() {
        let cb = breaker(5, Duration::from_secs(30), Duration::from_secs(60));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn test_opens_on_exactly_the_threshold_failure() {
        let cb = breaker(5, Duration::from_secs(30), Duration::from_secs(60));
        for _ in 0..4 {
            cb.record_failure();
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(matches!(cb.check(), Err(ApiError::CircuitOpen { .. })));
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let cb = breaker(3, Duration::from_secs(30), Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_window_lapse_restarts_count() {
        let cb = breaker(3, Duration::from_secs(30), Duration::from_millis(20));
        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        // Window has rolled over, so these two do not reach the threshold
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_recovery_timeout() {
        let cb = breaker(1, Duration::from_millis(20), Duration::from_secs(60));
        cb.record_failure();
        assert!(cb.check().is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.check().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_admits_exactly_one_trial() {
        let cb = breaker(1, Duration::from_millis(20), Duration::from_secs(60));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        assert!(cb.check().is_ok());
        // Trial is in flight; everything else fails fast
        assert!(matches!(cb.check(), Err(ApiError::CircuitOpen { .. })));
    }

    #[test]
    fn test_trial_success_closes() {
        let cb = breaker(1, Duration::from_millis(20), Duration::from_secs(60));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        cb.check().expect("trial should be admitted");

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn test_trial_failure_reopens_with_fresh_timeout() {
        let cb = breaker(1, Duration::from_millis(40), Duration::from_secs(60));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(50));
        cb.check().expect("trial should be admitted");

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        // Fresh opened_at: still rejecting right after the failed trial
        assert!(cb.check().is_err());
    }
}
