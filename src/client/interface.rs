//! The per-service client and its request pipeline.
//!
//! One [`ApiClient`] is constructed per destination service and owns every
//! piece of that service's resilience state: circuit breaker, token bucket
//! with its FIFO queue, and the health monitor. A request flows through an
//! explicit, linear pipeline:
//!
//! circuit check → token acquisition → transport → classify →
//! retry-or-resolve → breaker/health updates
//!
//! Nothing is shared across services, so a slow or failing upstream cannot
//! starve the others.

use crate::client::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::client::health::HealthMonitor;
use crate::client::rate_limiter::RateLimiter;
use crate::client::retry;
use crate::client::transport::{HttpTransport, Transport};
use crate::client::types::{
    ApiError, ApiResponse, HealthStatus, QueueStats, RateLimitInfo, RequestSpec, ServiceConfig,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ApiClient {
    config: ServiceConfig,
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    health: HealthMonitor,
}

impl ApiClient {
    /// Build a client over the reqwest transport.
    pub fn new(config: ServiceConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::assemble(config, transport))
    }

    /// Build a client over a caller-supplied transport (the test seam).
    pub fn with_transport(
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        let limiter = RateLimiter::new(config.rate_limit.clone());
        let breaker = CircuitBreaker::new(config.service.clone(), config.circuit_breaker.clone());
        let health = HealthMonitor::new(config.service.clone());
        Self {
            config,
            transport,
            limiter,
            breaker,
            health,
        }
    }

    /// Issue one logical call through the full pipeline.
    ///
    /// Resolves with the upstream response, or rejects with
    /// [`ApiError::CircuitOpen`], [`ApiError::RetryExhausted`],
    /// [`ApiError::Timeout`], or the last transport error for fatal statuses.
    /// However many attempts happen internally, the caller sees exactly one
    /// resolution.
    pub async fn request(&self, spec: RequestSpec) -> Result<ApiResponse, ApiError> {
        let started = Instant::now();
        let deadline = spec.deadline.map(|limit| started + limit);
        let mut attempts: u32 = 0;

        loop {
            // Each retry re-enters the pipeline fresh
            self.breaker.check()?;
            self.limiter.acquire(deadline).await?;

            match self.dispatch(&spec).await {
                Ok(response) => {
                    self.breaker.record_success();
                    debug!(
                        service = %self.config.service,
                        request_id = %spec.id,
                        status = response.status,
                        attempts = attempts + 1,
                        "request succeeded"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    // Only transport attempts count toward the breaker;
                    // queue waits and deadline expiries never reach here
                    self.breaker.record_failure();
                    attempts += 1;

                    if !retry::is_retryable(&error) {
                        warn!(
                            service = %self.config.service,
                            request_id = %spec.id,
                            error = %error,
                            "fatal error, not retrying"
                        );
                        return Err(error);
                    }

                    if attempts > self.config.retries {
                        warn!(
                            service = %self.config.service,
                            request_id = %spec.id,
                            attempts,
                            "retries exhausted"
                        );
                        return Err(ApiError::RetryExhausted {
                            attempts,
                            source: Box::new(error),
                        });
                    }

                    let delay = retry::backoff_delay(self.config.retry_delay, attempts - 1);
                    debug!(
                        service = %self.config.service,
                        request_id = %spec.id,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying after backoff"
                    );

                    if let Some(deadline) = deadline {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining < delay {
                            tokio::time::sleep(remaining).await;
                            return Err(ApiError::Timeout {
                                waited: started.elapsed(),
                            });
                        }
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One transport attempt plus classification. Rate-limit headers are
    /// captured from every response, including error statuses — a 429 is
    /// often the only place the reset timestamp shows up.
    async fn dispatch(&self, spec: &RequestSpec) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(spec).await?;
        self.health.observe_headers(&response.headers);

        if response.status >= 400 {
            return Err(ApiError::Status {
                status: response.status,
                message: snippet(&response.body),
            });
        }
        Ok(response)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.limiter.queue_stats()
    }

    pub fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        self.health.rate_limit_info()
    }

    pub fn health_status(&self) -> HealthStatus {
        self.health
            .status(self.breaker.state() != CircuitState::Open)
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn service(&self) -> &str {
        &self.config.service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("service", &self.config.service)
            .field("base_url", &self.config.base_url)
            .field("circuit_state", &self.breaker.state())
            .finish()
    }
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
