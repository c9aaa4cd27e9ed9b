//! Publer API client construction.
//!
//! Social scheduling is the lowest-criticality integration on the dashboard:
//! a missed sync shows up as a stale tile, not lost revenue. The breaker is
//! therefore slower to trip and slower to recover, keeping retry pressure off
//! an upstream that rate-limits aggressively.

use crate::client::{ApiClient, ApiError, CircuitBreakerConfig, RateLimitConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublerSettings {
    pub api_key: String,
    pub workspace_id: String,
}

pub fn service_config(settings: &PublerSettings) -> ServiceConfig {
    let mut default_headers = HashMap::new();
    default_headers.insert(
        "Authorization".to_string(),
        format!("Bearer-API {}", settings.api_key),
    );
    default_headers.insert(
        "Publer-Workspace-Id".to_string(),
        settings.workspace_id.clone(),
    );

    ServiceConfig {
        service: "publer".to_string(),
        base_url: "https://app.publer.com/api/v1".to_string(),
        retries: 3,
        retry_delay: Duration::from_millis(1000),
        request_timeout: Duration::from_secs(30),
        default_headers,
        rate_limit: RateLimitConfig {
            max_requests_per_second: 1.0,
            burst_size: 5,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(60),
            monitoring_period: Duration::from_secs(120),
        },
    }
}

pub fn create_publer_client(settings: &PublerSettings) -> Result<ApiClient, ApiError> {
    ApiClient::new(service_config(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PublerSettings {
        PublerSettings {
            api_key: "pk_test".to_string(),
            workspace_id: "ws_123".to_string(),
        }
    }

    #[test]
    fn test_production_thresholds() {
        let config = service_config(&settings());
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(
            config.circuit_breaker.recovery_timeout,
            Duration::from_secs(60)
        );
        assert_eq!(
            config.circuit_breaker.monitoring_period,
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_auth_headers_are_wired() {
        let config = service_config(&settings());
        assert_eq!(
            config.default_headers.get("Authorization"),
            Some(&"Bearer-API pk_test".to_string())
        );
        assert_eq!(
            config.default_headers.get("Publer-Workspace-Id"),
            Some(&"ws_123".to_string())
        );
    }

    #[test]
    fn test_client_builds() {
        assert!(create_publer_client(&settings()).is_ok());
    }
}
