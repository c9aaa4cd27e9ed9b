//! Shopify Admin API client construction.
//!
//! The REST Admin API enforces a leaky bucket of 40 requests with a refill of
//! 2 per second per shop, and reports usage in the
//! `X-Shopify-Shop-Api-Call-Limit` header. Shopify is a high-criticality
//! integration (inventory and order data feed the dashboard), so it gets the
//! tighter breaker settings.

use crate::client::{ApiClient, ApiError, CircuitBreakerConfig, RateLimitConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifySettings {
    /// Shop hostname, e.g. "acme.myshopify.com"
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
}

impl Default for ShopifySettings {
    fn default() -> Self {
        Self {
            shop_domain: String::new(),
            access_token: String::new(),
            api_version: "2024-07".to_string(),
        }
    }
}

pub fn service_config(settings: &ShopifySettings) -> ServiceConfig {
    let mut default_headers = HashMap::new();
    default_headers.insert(
        "X-Shopify-Access-Token".to_string(),
        settings.access_token.clone(),
    );

    ServiceConfig {
        service: "shopify".to_string(),
        base_url: format!(
            "https://{}/admin/api/{}",
            settings.shop_domain, settings.api_version
        ),
        retries: 3,
        retry_delay: Duration::from_millis(1000),
        request_timeout: Duration::from_secs(30),
        default_headers,
        rate_limit: RateLimitConfig {
            max_requests_per_second: 2.0,
            burst_size: 40,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            monitoring_period: Duration::from_secs(60),
        },
    }
}

pub fn create_shopify_client(settings: &ShopifySettings) -> Result<ApiClient, ApiError> {
    ApiClient::new(service_config(settings))
}
