//! Per-service health tracking.
//!
//! Caches the most recent rate-limit headers seen on any upstream response
//! and produces point-in-time snapshots for the dashboard. Snapshots are
//! derived views, recomputed on demand and never persisted.

use crate::client::types::{HealthStatus, RateLimitInfo};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

#[derive(Debug)]
pub struct HealthMonitor {
    service: String,
    rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl HealthMonitor {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            rate_limit: Mutex::new(None),
        }
    }

    /// Record rate-limit headers from an upstream response, if present.
    /// Responses without recognizable headers leave the cache untouched.
    pub fn observe_headers(&self, headers: &HashMap<String, String>) {
        if let Some(info) = RateLimitInfo::from_headers(headers) {
            trace!(
                service = %self.service,
                limit = info.limit,
                remaining = info.remaining,
                "rate limit headers updated"
            );
            *self.lock() = Some(info);
        }
    }

    pub fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        self.lock().clone()
    }

    pub fn status(&self, healthy: bool) -> HealthStatus {
        HealthStatus {
            service: self.service.clone(),
            healthy,
            last_checked: Utc::now(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RateLimitInfo>> {
        self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RateLimitInfo {
    /// Parse rate-limit headers from a response. Header names must already be
    /// lowercased (the transport guarantees this).
    ///
    /// Understands the common `x-ratelimit-*` triple and Shopify's combined
    /// `x-shopify-shop-api-call-limit: "32/40"` (used/limit) form.
    pub fn from_headers(headers: &HashMap<String, String>) -> Option<Self> {
        if let (Some(limit), Some(remaining)) = (
            parse_u32(headers.get("x-ratelimit-limit")),
            parse_u32(headers.get("x-ratelimit-remaining")),
        ) {
            return Some(Self {
                limit,
                remaining,
                reset_at: parse_reset(headers.get("x-ratelimit-reset")),
            });
        }

        if let Some(value) = headers.get("x-shopify-shop-api-call-limit") {
            let (used, limit) = value.split_once('/')?;
            let used: u32 = used.trim().parse().ok()?;
            let limit: u32 = limit.trim().parse().ok()?;
            return Some(Self {
                limit,
                remaining: limit.saturating_sub(used),
                reset_at: None,
            });
        }

        None
    }
}

fn parse_u32(value: Option<&String>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_reset(value: Option<&String>) -> Option<DateTime<Utc>> {
    let epoch_secs: i64 = value.and_then(|v| v.trim().parse().ok())?;
    DateTime::from_timestamp(epoch_secs, 0)
}
