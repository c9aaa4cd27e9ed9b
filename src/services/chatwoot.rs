//! Chatwoot API client construction.
//!
//! Chat support is customer-facing, so like Shopify it uses the tighter
//! breaker settings: trip fast, recover fast. Works against both
//! app.chatwoot.com and self-hosted installations.

use crate::client::{ApiClient, ApiError, CircuitBreakerConfig, RateLimitConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatwootSettings {
    /// Installation root, e.g. "https://app.chatwoot.com"
    pub base_url: String,
    pub account_id: u64,
    pub api_access_token: String,
}

impl Default for ChatwootSettings {
    fn default() -> Self {
        Self {
            base_url: "https://app.chatwoot.com".to_string(),
            account_id: 0,
            api_access_token: String::new(),
        }
    }
}

pub fn service_config(settings: &ChatwootSettings) -> ServiceConfig {
    let mut default_headers = HashMap::new();
    default_headers.insert(
        "api_access_token".to_string(),
        settings.api_access_token.clone(),
    );

    ServiceConfig {
        service: "chatwoot".to_string(),
        base_url: format!(
            "{}/api/v1/accounts/{}",
            settings.base_url.trim_end_matches('/'),
            settings.account_id
        ),
        retries: 3,
        retry_delay: Duration::from_millis(1000),
        request_timeout: Duration::from_secs(30),
        default_headers,
        rate_limit: RateLimitConfig {
            max_requests_per_second: 2.0,
            burst_size: 10,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            monitoring_period: Duration::from_secs(60),
        },
    }
}

pub fn create_chatwoot_client(settings: &ChatwootSettings) -> Result<ApiClient, ApiError> {
    ApiClient::new(service_config(settings))
}
