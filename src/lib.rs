//! # Outbound
//!
//! The resilient outbound API client layer of the operations dashboard. Every
//! third-party integration (Shopify, Publer, Chatwoot) funnels through a
//! per-service client that survives upstream rate limits, transient failures
//! and partial outages without cascading retries or losing request ordering.
//!
//! ## Architecture Overview
//!
//! The system consists of several key components organized into modules:
//!
//! - **[`client`]**: The request pipeline — token bucket with FIFO queuing,
//!   circuit breaker, retry classification and the transport seam
//! - **[`services`]**: Per-destination client constructors with production
//!   thresholds and auth wiring
//! - **[`integration`]**: The registry handing one isolated client per
//!   service to collaborators
//! - **[`cli`]**: Configuration discovery and the `outbound` diagnostic binary
//!
//! ## Features
//!
//! ### 🚦 Rate Limiting
//! - **Token Bucket**: Fractional refill at a fixed per-second rate, bursts up
//!   to a per-service cap
//! - **FIFO Queuing**: Calls that outrun the bucket park in a queue and are
//!   dispatched strictly in submission order
//! - **Backpressure**: Excess bursts drain at the refill rate instead of
//!   hammering upstream limits
//!
//! ### ⛔ Failure Isolation
//! - **Circuit Breaker**: closed → open → half-open per service, driven by a
//!   rolling failure window
//! - **Fast Fail**: An open circuit rejects before any network attempt,
//!   protecting the degraded upstream
//! - **Per-Service Thresholds**: Criticality-weighted trip and recovery
//!   settings
//!
//! ### 🔁 Retry Policy
//! - **Classification**: 429 and 5xx retry; other 4xx fail immediately
//! - **Exponential Backoff**: `retry_delay × 2^attempt`, bounded by the
//!   call's deadline
//! - **Single Resolution**: Callers see one result no matter how many
//!   attempts happened internally
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outbound::client::RequestSpec;
//! use outbound::services::{ShopifySettings, create_shopify_client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_shopify_client(&ShopifySettings {
//!         shop_domain: "acme.myshopify.com".to_string(),
//!         access_token: std::env::var("SHOPIFY_ACCESS_TOKEN")?,
//!         api_version: "2024-07".to_string(),
//!     })?;
//!
//!     let response = client.request(RequestSpec::get("/products.json")).await?;
//!     println!("Shopify answered {}", response.status);
//!     println!("Health: {:?}", client.health_status());
//!     Ok(())
//! }
//! ```

/// The resilient request pipeline.
///
/// One [`client::ApiClient`] per destination service, composing circuit
/// check → token acquisition → transport → classification → retry into an
/// explicit, linearly ordered pipeline.
pub mod client;

/// Per-destination client constructors.
///
/// Production thresholds, base-URL shaping and static auth headers for each
/// supported integration.
pub mod services;

/// Service registry and system-wide health aggregation.
///
/// Owns one isolated client per configured service and exposes the aggregate
/// health snapshot the dashboard renders.
pub mod integration;

/// Argument parsing and configuration discovery for the `outbound` binary.
pub mod cli;

// Re-export the core client types
pub use client::{
    ApiClient, ApiError, ApiResponse, CircuitState, HealthStatus, HttpMethod, QueueStats,
    RateLimitInfo, RequestSpec, ServiceConfig, Transport,
};

// Re-export service constructors
pub use services::{
    ChatwootSettings, PublerSettings, ShopifySettings, create_chatwoot_client,
    create_publer_client, create_shopify_client,
};

// Re-export integration types
pub use integration::{GatewayConfig, Integrations, SystemStatus};
