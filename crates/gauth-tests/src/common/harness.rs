// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`TestApp`] builds the production router over a seeded in-memory store and
//! an in-memory audit logger. Requests go through the whole middleware stack
//! with `tower::ServiceExt::oneshot`; no socket is bound.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use gauth_api::{ApiConfig, ApiServerBuilder};
use gauth_core::seed::seed_defaults;
use gauth_core::{
    AuditLog, CredentialStore, InMemoryAuditLogger, MemoryStore, NewUser, PasswordHasher, User,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use super::fixtures::{AdminFixtures, ConfigFixtures, TEST_BCRYPT_COST};

// =============================================================================
// TestApp
// =============================================================================

/// Access and refresh tokens returned by a login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

/// The application under test.
pub struct TestApp {
    /// Credential store behind the router.
    pub store: Arc<MemoryStore>,
    /// Audit sink behind the router.
    pub audit: Arc<InMemoryAuditLogger>,
    /// Configuration the router was built with.
    pub config: ApiConfig,
    router: Router,
}

impl TestApp {
    /// Creates an app with [`ConfigFixtures::api`].
    pub async fn new() -> Self {
        Self::with_config(ConfigFixtures::api()).await
    }

    /// Creates an app with a custom configuration. Default roles and the
    /// administrator are seeded.
    pub async fn with_config(config: ApiConfig) -> Self {
        super::init_test_logging();

        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(InMemoryAuditLogger::new());

        seed_defaults(
            store.as_ref(),
            &PasswordHasher::new(TEST_BCRYPT_COST),
            &AdminFixtures::seed_options(),
        )
        .await
        .expect("Failed to seed test store");

        let server = ApiServerBuilder::new()
            .config(config.clone())
            .store(store.clone())
            .audit_logger(audit.clone())
            .build()
            .expect("Failed to build test server");

        Self {
            store,
            audit,
            config,
            router: server.router(),
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Sends a request through the full middleware stack.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a request without a body.
    pub async fn send(&self, method: Method, path: &str, token: Option<&str>) -> TestResponse {
        self.request(RequestBuilder::new(method, path).bearer(token).build())
            .await
    }

    /// Sends a request with a JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> TestResponse {
        self.request(RequestBuilder::new(method, path).bearer(token).json(body))
            .await
    }

    /// `GET path`.
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, token).await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send_json(Method::POST, path, body, token).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send_json(Method::PUT, path, body, token).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, token).await
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Posts to the login endpoint.
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/login",
            serde_json::json!({ "username": username, "password": password }),
            None,
        )
        .await
    }

    /// Logs in and returns the tokens, panicking on failure.
    pub async fn login_tokens(&self, username: &str, password: &str) -> TokenPair {
        let response = self.login(username, password).await;
        response.assert_status(StatusCode::OK);
        let body = response.json();
        TokenPair {
            access_token: body["access_token"]
                .as_str()
                .expect("access_token")
                .to_string(),
            refresh_token: body["refresh_token"]
                .as_str()
                .expect("refresh_token")
                .to_string(),
        }
    }

    /// Logs in as the seeded administrator.
    pub async fn login_admin(&self) -> TokenPair {
        self.login_tokens(&AdminFixtures::username(), &AdminFixtures::password())
            .await
    }

    // =========================================================================
    // Store Helpers
    // =========================================================================

    /// Creates a user directly in the store with the given role names.
    pub async fn create_user(&self, username: &str, password: &str, roles: &[&str]) -> User {
        let hash = PasswordHasher::new(TEST_BCRYPT_COST)
            .hash(password)
            .expect("Failed to hash password");
        let user = self
            .store
            .create_user(NewUser::new(
                username,
                format!("{}@example.com", username),
                hash,
            ))
            .await
            .expect("Failed to create user");

        let mut role_ids = Vec::with_capacity(roles.len());
        for name in roles {
            let role = self
                .store
                .find_role_by_name(name)
                .await
                .expect("Failed to look up role")
                .unwrap_or_else(|| panic!("Role {} is not seeded", name));
            role_ids.push(role.id);
        }
        self.store
            .set_user_roles(user.id, &role_ids)
            .await
            .expect("Failed to assign roles");

        user
    }

    /// Returns the seeded administrator.
    pub async fn admin(&self) -> User {
        self.store
            .find_user_by_login(&AdminFixtures::username())
            .await
            .expect("Store lookup failed")
            .expect("Administrator is seeded")
    }

    // =========================================================================
    // Audit Helpers
    // =========================================================================

    /// Waits until at least `count` audit records exist, then returns all of
    /// them. Audit writes are detached tasks, so they land after the response.
    pub async fn audit_entries(&self, count: usize) -> Vec<AuditLog> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.audit.len() < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.audit.entries()
    }

    /// Waits briefly for stragglers, then returns every audit record.
    pub async fn settled_audit_entries(&self) -> Vec<AuditLog> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.audit.entries()
    }
}

// =============================================================================
// RequestBuilder
// =============================================================================

/// Builds test requests.
pub struct RequestBuilder {
    builder: axum::http::request::Builder,
}

impl RequestBuilder {
    /// Starts a request.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            builder: Request::builder().method(method).uri(path),
        }
    }

    /// Adds `Authorization: Bearer <token>` when a token is given.
    pub fn bearer(mut self, token: Option<&str>) -> Self {
        if let Some(token) = token {
            self.builder = self
                .builder
                .header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self
    }

    /// Adds an arbitrary header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the client address through `X-Forwarded-For`.
    pub fn from_ip(self, ip: IpAddr) -> Self {
        self.header("x-forwarded-for", &ip.to_string())
    }

    /// Finishes with an empty body.
    pub fn build(self) -> Request<Body> {
        self.builder.body(Body::empty()).expect("Invalid test request")
    }

    /// Finishes with a JSON body.
    pub fn json(self, body: Value) -> Request<Body> {
        self.builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Invalid test request")
    }
}

// =============================================================================
// TestResponse
// =============================================================================

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl TestResponse {
    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    /// Returns the `error` field of an error body.
    pub fn error_message(&self) -> String {
        self.json()["error"]
            .as_str()
            .unwrap_or_else(|| panic!("No error field in {}", String::from_utf8_lossy(&self.body)))
            .to_string()
    }

    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Asserts the status code, printing the body on mismatch.
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Unexpected status; body: {}",
            String::from_utf8_lossy(&self.body)
        );
    }
}
