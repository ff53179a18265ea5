// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::map_response,
    routing::{get, post},
    Router,
};
use gauth_core::{AuditLogger, CredentialStore};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{JwtManager, Role};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{
    recovery_layer, timeout_response, AuditLayer, AuthLayer, RateLimitLayer, RbacLayer,
};
use crate::state::{AppState, AppStateBuilder};

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
    rate_limit: RateLimitLayer,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let rate_limit = RateLimitLayer::new(config.rate_limit.clone());
        Self {
            state,
            config,
            rate_limit,
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Layers from outermost to innermost: panic recovery, tracing, request
    /// timeout, compression, CORS, rate limiting, audit, authentication. The
    /// user routes add an `admin` role gate below authentication. Timed-out
    /// requests are rewritten to the JSON error body on the way out.
    pub fn router(&self) -> Router {
        let auth = AuthLayer::new(self.state.sessions.clone()).with_default_public_paths();
        let audit = AuditLayer::new(self.state.audit_logger.clone(), self.config.audit.clone());

        let middleware_stack = ServiceBuilder::new()
            .layer(recovery_layer())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(CompressionLayer::new())
            .layer(create_cors_layer(&self.config))
            .layer(self.rate_limit.clone())
            .layer(audit)
            .layer(auth);

        let users = Router::new()
            .route(
                "/api/users",
                get(handlers::list_users).post(handlers::create_user),
            )
            .route(
                "/api/users/{id}",
                get(handlers::get_user)
                    .put(handlers::update_user)
                    .delete(handlers::delete_user),
            )
            .route_layer(RbacLayer::require_role(Role::Admin));

        Router::new()
            // Public
            .route("/health", get(handlers::health))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/refresh", post(handlers::refresh_token))
            // Bearer
            .route("/api/auth/logout", post(handlers::logout))
            .route("/api/auth/me", get(handlers::me))
            .route("/api/auth/change-password", post(handlers::change_password))
            // Bearer + admin
            .merge(users)
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware_stack)
            .layer(map_response(timeout_response))
            .with_state(self.state.clone())
    }

    /// Runs the server until the process is stopped.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();
        let cleanup = self.rate_limit.spawn_cleanup();

        info!(
            store = %self.state.store.name(),
            audit_logger = %self.state.audit_logger.name(),
            "Starting API server on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await;

        if let Some(cleanup) = cleanup {
            cleanup.abort();
        }
        if let Err(e) = self.state.audit_logger.flush().await {
            warn!(error = %e, "Failed to flush audit log");
        }

        result.map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;
        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
///
/// A `*` origin allows any origin without credentials; otherwise only the
/// listed origins are allowed.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let layer = CorsLayer::new()
        .max_age(cors.max_age)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if cors.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(cors.allow_credentials)
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
#[derive(Default)]
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the credential store.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.state_builder = self.state_builder.store(store);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.state_builder = self.state_builder.jwt_manager(manager);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.state_builder = self.state_builder.audit_logger(logger);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::config::CorsConfig;
    use axum::body::Body;
    use axum::http::Request;
    use gauth_core::MemoryStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_config() -> ApiConfig {
        ApiConfig::default()
            .with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough"))
            .with_bcrypt_cost(4)
    }

    fn test_server() -> ApiServer {
        ApiServerBuilder::new()
            .config(test_config())
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_server_builder() {
        assert_eq!(test_server().addr().port(), 8080);
    }

    #[test]
    fn test_builder_requires_store() {
        assert!(ApiServerBuilder::new().config(test_config()).build().is_err());
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_server()
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "gauth");
    }

    #[tokio::test]
    async fn test_protected_route_requires_header() {
        let response = test_server()
            .router()
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Authorization header required");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = test_server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/auth/login")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn test_cors_layer_permissive() {
        let mut config = test_config();
        config.cors = CorsConfig::permissive();
        let _layer = create_cors_layer(&config);
    }
}
