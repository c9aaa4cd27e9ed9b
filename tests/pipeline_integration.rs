//! End-to-end pipeline tests against the public crate surface.
//!
//! A scripted transport stands in for the network; everything else — breaker,
//! bucket, queue, retry policy, registry — is the real production wiring.

use async_trait::async_trait;
use outbound::client::{
    ApiClient, ApiError, ApiResponse, CircuitState, RequestSpec, ServiceConfig, Transport,
};
use outbound::integration::Integrations;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTransport {
    script: Mutex<VecDeque<u16>>,
    calls: Mutex<usize>,
}

impl ScriptedTransport {
    fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(statuses.iter().copied().collect()),
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _spec: &RequestSpec) -> Result<ApiResponse, ApiError> {
        *self.calls.lock().unwrap() += 1;
        let status = self.script.lock().unwrap().pop_front().unwrap_or(200);
        Ok(ApiResponse {
            status,
            headers: HashMap::new(),
            body: "{}".to_string(),
        })
    }
}

fn fast_config(service: &str) -> ServiceConfig {
    let mut config = ServiceConfig {
        service: service.to_string(),
        base_url: "https://api.example.com".to_string(),
        retries: 2,
        retry_delay: Duration::from_millis(5),
        ..ServiceConfig::default()
    };
    config.rate_limit.max_requests_per_second = 1000.0;
    config.rate_limit.burst_size = 50;
    config
}

#[tokio::test]
async fn test_full_pipeline_retries_and_resolves() {
    let transport = ScriptedTransport::new(&[503, 200]);
    let client =
        ApiClient::with_transport(fast_config("shopify"), Arc::clone(&transport) as Arc<dyn Transport>)
            .expect("client builds");

    let response = client
        .request(RequestSpec::get("/orders.json"))
        .await
        .expect("second attempt succeeds");

    assert_eq!(response.status, 200);
    assert_eq!(transport.call_count(), 2);
    assert!(client.health_status().healthy);
}

#[tokio::test]
async fn test_registry_hands_out_isolated_clients() {
    let integrations = Integrations::new(Default::default()).expect("registry builds");

    let failing = ScriptedTransport::new(&[500, 500, 500]);
    let mut config = fast_config("publer");
    config.retries = 0;
    config.circuit_breaker.failure_threshold = 3;
    integrations.register(
        ApiClient::with_transport(config, Arc::clone(&failing) as Arc<dyn Transport>)
            .expect("client builds"),
    );

    let healthy = ScriptedTransport::new(&[]);
    integrations.register(
        ApiClient::with_transport(
            fast_config("chatwoot"),
            Arc::clone(&healthy) as Arc<dyn Transport>,
        )
        .expect("client builds"),
    );

    // Trip publer's breaker
    let publer = integrations.client("publer").expect("publer registered");
    for _ in 0..3 {
        publer
            .request(RequestSpec::get("/posts"))
            .await
            .expect_err("scripted failure");
    }
    assert_eq!(publer.circuit_state(), CircuitState::Open);

    // Publer is degraded, chatwoot is untouched
    let status = integrations.system_status();
    assert!(!status.healthy);
    let chatwoot = integrations.client("chatwoot").expect("chatwoot registered");
    chatwoot
        .request(RequestSpec::get("/conversations"))
        .await
        .expect("independent service still works");
    assert!(chatwoot.health_status().healthy);
}

#[tokio::test]
async fn test_open_circuit_skips_the_network_entirely() {
    let transport = ScriptedTransport::new(&[500]);
    let mut config = fast_config("shopify");
    config.retries = 0;
    config.circuit_breaker.failure_threshold = 1;
    config.circuit_breaker.recovery_timeout = Duration::from_secs(30);
    let client =
        ApiClient::with_transport(config, Arc::clone(&transport) as Arc<dyn Transport>)
            .expect("client builds");

    client
        .request(RequestSpec::get("/shop.json"))
        .await
        .expect_err("first call trips the breaker");

    for _ in 0..3 {
        let error = client
            .request(RequestSpec::get("/shop.json"))
            .await
            .expect_err("circuit open");
        assert!(matches!(error, ApiError::CircuitOpen { .. }));
    }
    assert_eq!(transport.call_count(), 1, "no attempts while open");
}
