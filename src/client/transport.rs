//! Transport seam between the pipeline and the network.
//!
//! The pipeline talks to a [`Transport`] so tests can script upstream
//! behavior without sockets. [`HttpTransport`] is the production
//! implementation over `reqwest`; protocol-level concerns (pooling, TLS,
//! redirects) are delegated to it entirely.

use crate::client::types::{ApiError, ApiResponse, HttpMethod, RequestSpec, ServiceConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one attempt. Any HTTP status is returned as `Ok` — the
    /// pipeline classifies status codes; `Err` is reserved for failures that
    /// never produced a response (connect errors, resets, upstream timeout).
    async fn send(&self, spec: &RequestSpec) -> Result<ApiResponse, ApiError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    default_headers: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidConfig(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            default_headers: config.default_headers.clone(),
        })
    }

    fn build_url(&self, spec: &RequestSpec) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            spec.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid path '{}': {}", spec.path, e)))?;
        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&spec.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<ApiResponse, ApiError> {
        let url = self.build_url(spec)?;
        debug!(request_id = %spec.id, method = %spec.method, %url, "dispatching request");

        let mut request = self.client.request(spec.method.into(), url);
        for (key, value) in self.default_headers.iter().chain(spec.headers.iter()) {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Network(format!("upstream timeout: {error}"))
    } else if error.is_connect() {
        ApiError::Network(format!("connection failed: {error}"))
    } else {
        ApiError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::RequestSpec;

    fn transport(base_url: &str) -> HttpTransport {
        let config = ServiceConfig {
            base_url: base_url.to_string(),
            ..ServiceConfig::default()
        };
        HttpTransport::new(&config).expect("transport builds")
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = ServiceConfig {
            base_url: "not a url".to_string(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(ApiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_joins_paths_without_doubled_slashes() {
        let transport = transport("https://shop.example.com/admin/api/2024-07/");
        let url = transport
            .build_url(&RequestSpec::get("/products.json"))
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/admin/api/2024-07/products.json"
        );
    }

    #[test]
    fn test_appends_query_pairs() {
        let transport = transport("https://app.example.com/api/v1");
        let url = transport
            .build_url(
                &RequestSpec::get("orders")
                    .with_query("status", "open")
                    .with_query("limit", "50"),
            )
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://app.example.com/api/v1/orders?status=open&limit=50"
        );
    }
}
