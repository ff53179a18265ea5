// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Sliding-window rate limiting per client IP.

use std::collections::VecDeque;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};

use crate::error::ApiError;
use crate::extractors::resolve_client_ip;

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Configuration for rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Requests admitted per client within one window.
    pub max_requests: u32,
    /// Length of the sliding window.
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Upper bound on tracked client IPs.
    pub max_tracked_clients: usize,
    /// How often idle clients are evicted.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window: Duration::from_secs(60),
            max_tracked_clients: 10_000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Creates a disabled rate limiter configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Creates a configuration admitting `max_requests` per `window`.
    pub fn per_window(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ..Default::default()
        }
    }
}

// =============================================================================
// Sliding Window
// =============================================================================

#[derive(Debug)]
struct ClientWindow {
    hits: VecDeque<Instant>,
    last_seen: Instant,
}

impl ClientWindow {
    fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drops hits that fell out of the window ending at `now`.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is admitted.
    Allowed {
        /// Requests still available in the current window.
        remaining: u32,
    },
    /// Request is rejected.
    Limited {
        /// Whole seconds until the oldest hit leaves the window.
        retry_after: u64,
    },
}

impl RateLimitDecision {
    /// Returns `true` if the request is admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Sliding-window log limiter keyed by client IP.
///
/// Every client's window is guarded by its own map shard; a window never holds
/// more than `max_requests` timestamps.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    clients: DashMap<IpAddr, ClientWindow>,
}

impl SlidingWindowLimiter {
    /// Creates a new limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Checks and records a request from `ip` at the current instant.
    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        self.check_at(ip, Instant::now())
    }

    /// Checks and records a request from `ip` at `now`.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> RateLimitDecision {
        let max = self.config.max_requests;
        if !self.config.enabled {
            return RateLimitDecision::Allowed { remaining: max };
        }

        if !self.clients.contains_key(&ip) && self.clients.len() >= self.config.max_tracked_clients {
            self.evict_least_recent();
        }

        let window = self.config.window;
        let mut entry = self
            .clients
            .entry(ip)
            .or_insert_with(|| ClientWindow::new(now));
        let client = entry.value_mut();
        client.last_seen = now;
        client.prune(now, window);

        if client.hits.len() >= max as usize {
            let retry_after = client
                .hits
                .front()
                .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(window);
            return RateLimitDecision::Limited {
                retry_after: ceil_secs(retry_after),
            };
        }

        client.hits.push_back(now);
        RateLimitDecision::Allowed {
            remaining: max.saturating_sub(client.hits.len() as u32),
        }
    }

    /// Evicts clients with no hits left in the window ending at `now`.
    ///
    /// Returns the number of evicted clients.
    pub fn cleanup(&self, now: Instant) -> usize {
        let window = self.config.window;
        let before = self.clients.len();
        self.clients.retain(|_, client| {
            client.prune(now, window);
            !client.hits.is_empty()
        });
        before.saturating_sub(self.clients.len())
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .clients
            .iter()
            .min_by_key(|entry| entry.value().last_seen)
            .map(|entry| *entry.key());

        if let Some(ip) = oldest {
            self.clients.remove(&ip);
            tracing::debug!(client_ip = %ip, "Evicted least recently seen client");
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

// =============================================================================
// RateLimitLayer
// =============================================================================

/// Layer for rate limiting.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<SlidingWindowLimiter>,
}

impl RateLimitLayer {
    /// Creates a new rate limit layer.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(SlidingWindowLimiter::new(config)),
        }
    }

    /// Creates a disabled rate limit layer.
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }

    /// Returns the shared limiter.
    pub fn limiter(&self) -> Arc<SlidingWindowLimiter> {
        self.limiter.clone()
    }

    /// Spawns the periodic cleanup task on the current runtime.
    ///
    /// The task stops once every handle to the limiter is dropped. Returns
    /// `None` outside a tokio runtime or when limiting is disabled.
    pub fn spawn_cleanup(&self) -> Option<tokio::task::JoinHandle<()>> {
        let config = self.limiter.config();
        if !config.enabled || config.cleanup_interval.is_zero() {
            return None;
        }

        let handle = tokio::runtime::Handle::try_current().ok()?;
        let interval = config.cleanup_interval;
        let limiter: Weak<SlidingWindowLimiter> = Arc::downgrade(&self.limiter);

        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let evicted = limiter.cleanup(Instant::now());
                if evicted > 0 {
                    tracing::debug!(evicted, "Rate limiter cleanup");
                }
            }
        }))
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

// =============================================================================
// RateLimitMiddleware
// =============================================================================

/// Middleware for rate limiting.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<SlidingWindowLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Clients without a resolvable address share one bucket.
            let client_ip = resolve_client_ip(req.headers(), req.extensions())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

            match limiter.check(client_ip) {
                RateLimitDecision::Allowed { .. } => inner.call(req).await,
                RateLimitDecision::Limited { retry_after } => {
                    tracing::debug!(
                        client_ip = %client_ip,
                        retry_after,
                        "Rate limit exceeded"
                    );
                    Ok(ApiError::rate_limit_exceeded(Some(retry_after)).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
