use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

pub type RequestId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service: String,
    pub base_url: String,
    pub retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub default_headers: HashMap<String, String>,
    pub rate_limit: RateLimitConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests_per_second: f64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub monitoring_period: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service: "default".to_string(),
            base_url: "http://localhost".to_string(),
            retries: 3,
            retry_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            rate_limit: RateLimitConfig {
                max_requests_per_second: 2.0,
                burst_size: 5,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 5,
                recovery_timeout: Duration::from_secs(30),
                monitoring_period: Duration::from_secs(60), // rolling failure window
            },
        }
    }
}

impl ServiceConfig {
    /// Validate construction-time invariants before wiring a client
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.service.is_empty() {
            return Err(ApiError::InvalidConfig("service name is empty".to_string()));
        }
        if self.rate_limit.max_requests_per_second <= 0.0 {
            return Err(ApiError::InvalidConfig(
                "max_requests_per_second must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.burst_size == 0 {
            return Err(ApiError::InvalidConfig(
                "burst_size must be at least 1".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ApiError::InvalidConfig(
                "failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical outbound call, before it enters the pipeline
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub id: RequestId,
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    /// Overall deadline for the call, covering queue wait, attempts and backoff
    pub deadline: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
            deadline: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut spec = Self::new(HttpMethod::Post, path);
        spec.body = Some(body);
        spec
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Upstream response after a successful trip through the pipeline.
/// Header names are lowercased by the transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Bucket and queue counters for one service, read-only snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    pub queue_length: usize,
    pub tokens: f64,
    pub processing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: String,
    pub healthy: bool,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("circuit breaker is open for {service}")]
    CircuitOpen { service: String },
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {waited:?}")]
    Timeout { waited: Duration },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::RetryExhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}
