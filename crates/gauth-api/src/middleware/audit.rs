// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{body::Body, http::Request, response::Response};
use gauth_core::audit::{AuditLog, AuditLogger};
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::config::AuditConfig;
use crate::extractors::{resolve_client_ip, user_agent};

// =============================================================================
// AuditLayer
// =============================================================================

/// Layer for audit logging.
///
/// Every request outside `exclude_paths` produces exactly one [`AuditLog`],
/// written from a detached task after the response is ready. The acting user
/// is taken from the [`AuthContext`] the auth middleware attaches to the
/// response, so this layer has to sit outside it.
#[derive(Clone)]
pub struct AuditLayer {
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
}

impl AuditLayer {
    /// Creates a new audit layer.
    pub fn new(logger: Arc<dyn AuditLogger>, config: AuditConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }

    /// Creates a no-op audit layer that doesn't log anything.
    pub fn noop() -> Self {
        Self::new(Arc::new(gauth_core::NoOpAuditLogger), AuditConfig::disabled())
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware {
            inner,
            logger: self.logger.clone(),
            config: self.config.clone(),
        }
    }
}

// =============================================================================
// AuditMiddleware
// =============================================================================

/// Middleware for audit logging.
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
}

/// Request attributes captured before the inner service consumes the request.
struct RequestSnapshot {
    method: String,
    path: String,
    query: String,
    client_ip: String,
    user_agent: String,
    start: Instant,
}

impl RequestSnapshot {
    fn capture(req: &Request<Body>) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().unwrap_or_default().to_string(),
            client_ip: resolve_client_ip(req.headers(), req.extensions())
                .map(|ip| ip.to_string())
                .unwrap_or_default(),
            user_agent: user_agent(req.headers()),
            start: Instant::now(),
        }
    }

    fn into_log(self, response: &Response) -> AuditLog {
        let duration_ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let log = AuditLog::http_request(
            &self.method,
            &self.path,
            response.status().as_u16(),
            duration_ms,
            &self.query,
        )
        .with_client(self.client_ip, self.user_agent);

        match response.extensions().get::<AuthContext>() {
            Some(ctx) => log.with_user(ctx.user_id),
            None => log,
        }
    }
}

impl<S> Service<Request<Body>> for AuditMiddleware<S>
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
        let snapshot = self
            .config
            .should_audit(req.uri().path())
            .then(|| RequestSnapshot::capture(&req));
        let logger = self.logger.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if let Some(snapshot) = snapshot {
                let log = snapshot.into_log(&response);
                tokio::spawn(async move {
                    if let Err(e) = logger.log(log).await {
                        tracing::warn!(error = %e, "Failed to write audit log");
                    }
                });
            }

            Ok(response)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
