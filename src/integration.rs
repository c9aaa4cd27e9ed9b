//! # Service Registry and System-Wide Health
//!
//! Wires one isolated [`ApiClient`] per configured destination service and
//! hands them to collaborators explicitly — there is no module-level client
//! state anywhere in this crate. The dashboard layer asks the registry for a
//! client by name and for aggregate health across every integration.
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  Integrations                    │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐    │
//! │  │  shopify   │ │   publer   │ │  chatwoot  │    │
//! │  │ ApiClient  │ │ ApiClient  │ │ ApiClient  │    │
//! │  └────────────┘ └────────────┘ └────────────┘    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Each client owns its own bucket, queue, breaker and health monitor, so a
//! degraded upstream can never starve the others.

use crate::client::{ApiClient, HealthStatus, QueueStats, RateLimitInfo};
use crate::services::{
    ChatwootSettings, PublerSettings, ShopifySettings, create_chatwoot_client,
    create_publer_client, create_shopify_client,
};
use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Which destinations to wire. Absent services are simply not constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub shopify: Option<ShopifySettings>,
    pub publer: Option<PublerSettings>,
    pub chatwoot: Option<ChatwootSettings>,
}

/// Per-service slice of a [`SystemStatus`] snapshot.
#[derive(Debug, Clone)]
pub struct ServiceReport {
    pub health: HealthStatus,
    pub queue: QueueStats,
    pub rate_limit: Option<RateLimitInfo>,
}

#[derive(Debug, Clone)]
pub struct SystemStatus {
    pub healthy: bool,
    pub services: Vec<ServiceReport>,
}

pub struct Integrations {
    clients: DashMap<String, Arc<ApiClient>>,
}

impl Integrations {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let integrations = Self {
            clients: DashMap::new(),
        };

        if let Some(settings) = &config.shopify {
            integrations.register(
                create_shopify_client(settings).context("Failed to initialize Shopify client")?,
            );
        }
        if let Some(settings) = &config.publer {
            integrations.register(
                create_publer_client(settings).context("Failed to initialize Publer client")?,
            );
        }
        if let Some(settings) = &config.chatwoot {
            integrations.register(
                create_chatwoot_client(settings).context("Failed to initialize Chatwoot client")?,
            );
        }

        info!(
            services = integrations.clients.len(),
            "integrations registry initialized"
        );
        Ok(integrations)
    }

    /// Register a pre-built client, replacing any previous one for the same
    /// service name.
    pub fn register(&self, client: ApiClient) {
        self.clients
            .insert(client.service().to_string(), Arc::new(client));
    }

    pub fn client(&self, service: &str) -> Option<Arc<ApiClient>> {
        self.clients.get(service).map(|entry| Arc::clone(entry.value()))
    }

    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Aggregate health across every registered service. `healthy` is true
    /// only when no circuit is open.
    pub fn system_status(&self) -> SystemStatus {
        let mut services: Vec<ServiceReport> = self
            .clients
            .iter()
            .map(|entry| ServiceReport {
                health: entry.health_status(),
                queue: entry.queue_stats(),
                rate_limit: entry.rate_limit_info(),
            })
            .collect();
        services.sort_by(|a, b| a.health.service.cmp(&b.health.service));

        SystemStatus {
            healthy: services.iter().all(|report| report.health.healthy),
            services,
        }
    }
}

impl std::fmt::Debug for Integrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrations")
            .field("services", &self.services())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_config() -> GatewayConfig {
        GatewayConfig {
            shopify: Some(ShopifySettings {
                shop_domain: "acme.myshopify.com".to_string(),
                access_token: "shpat_test".to_string(),
                api_version: "2024-07".to_string(),
            }),
            publer: Some(PublerSettings {
                api_key: "pk_test".to_string(),
                workspace_id: "ws_1".to_string(),
            }),
            chatwoot: None,
        }
    }

    #[test]
    fn test_registers_only_configured_services() {
        let integrations = Integrations::new(gateway_config()).expect("registry builds");
        assert_eq!(integrations.services(), vec!["publer", "shopify"]);
        assert!(integrations.client("shopify").is_some());
        assert!(integrations.client("chatwoot").is_none());
    }

    #[test]
    fn test_empty_config_builds_empty_registry() {
        let integrations = Integrations::new(GatewayConfig::default()).expect("registry builds");
        assert!(integrations.services().is_empty());
        let status = integrations.system_status();
        assert!(status.healthy);
        assert!(status.services.is_empty());
    }

    #[test]
    fn test_fresh_registry_reports_healthy() {
        let integrations = Integrations::new(gateway_config()).expect("registry builds");
        let status = integrations.system_status();
        assert!(status.healthy);
        assert_eq!(status.services.len(), 2);
        for report in &status.services {
            assert!(report.health.healthy);
            assert_eq!(report.queue.queue_length, 0);
            assert!(report.rate_limit.is_none(), "no traffic yet");
        }
    }

    #[test]
    fn test_register_replaces_existing_client() {
        let integrations = Integrations::new(gateway_config()).expect("registry builds");
        let before = integrations.client("shopify").expect("shopify registered");

        let replacement = create_shopify_client(&ShopifySettings {
            shop_domain: "other.myshopify.com".to_string(),
            access_token: "shpat_other".to_string(),
            api_version: "2024-07".to_string(),
        })
        .expect("client builds");
        integrations.register(replacement);

        let after = integrations.client("shopify").expect("still registered");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(integrations.services().len(), 2, "name was replaced, not added");
    }
}
