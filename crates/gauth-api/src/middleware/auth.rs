// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, TokenType};
use crate::config::PUBLIC_PATHS;
use crate::error::{ApiError, MISSING_AUTHORIZATION};
use crate::extractors::resolve_client_ip;
use crate::session::SessionIssuer;

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for bearer token authentication.
///
/// Requests to public paths pass through untouched. Every other request must
/// carry `Authorization: Bearer <access token>` bound to a live session; the
/// resolved [`AuthContext`] is inserted into the request extensions, and
/// copied onto the response so outer layers can see who made the request.
#[derive(Clone)]
pub struct AuthLayer {
    sessions: Arc<SessionIssuer>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer with no public paths.
    pub fn new(sessions: Arc<SessionIssuer>) -> Self {
        Self {
            sessions,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Sets the paths that don't require authentication.
    pub fn with_public_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Uses the standard public paths: health, login and refresh.
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths(PUBLIC_PATHS)
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            sessions: self.sessions.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    sessions: Arc<SessionIssuer>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    /// Checks if a path is public.
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }

        self.public_paths.iter().any(|public| {
            public
                .strip_suffix('*')
                .is_some_and(|prefix| path.starts_with(prefix))
        })
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let sessions = self.sessions.clone();
        let is_public = self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            let token = match bearer_token(&req) {
                BearerToken::Present(token) => token,
                BearerToken::Missing => {
                    tracing::debug!("No authorization header provided");
                    return Ok(ApiError::unauthorized(MISSING_AUTHORIZATION).into_response());
                }
                BearerToken::Malformed => {
                    tracing::debug!("Authorization header is not a bearer token");
                    return Ok(ApiError::invalid_token().into_response());
                }
            };

            let (claims, user) = match sessions.authenticate(&token, TokenType::Access).await {
                Ok(resolved) => resolved,
                Err(e) => return Ok(e.into_response()),
            };

            let client_ip = resolve_client_ip(req.headers(), req.extensions());
            let auth_ctx = AuthContext::from_user(&user, claims.session_token)
                .with_client_ip(client_ip)
                .with_request_id(Uuid::now_v7());

            tracing::debug!(
                user_id = %auth_ctx.user_id,
                request_id = %auth_ctx.request_id,
                "Request authenticated"
            );

            req.extensions_mut().insert(auth_ctx.clone());
            let mut response = inner.call(req).await?;
            response.extensions_mut().insert(auth_ctx);
            Ok(response)
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum BearerToken {
    Present(String),
    Missing,
    Malformed,
}

/// Extracts the bearer token from the Authorization header.
fn bearer_token<B>(req: &Request<B>) -> BearerToken {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return BearerToken::Missing;
    };

    match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => BearerToken::Present(token.trim().to_string()),
        _ => BearerToken::Malformed,
    }
}

// =============================================================================
// Tests
// =============================================================================
