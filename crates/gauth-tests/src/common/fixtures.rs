// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Configurations, credentials and hand-crafted tokens shared by the suites.

use std::time::Duration;

use gauth_api::{ApiConfig, AuditConfig, Claims, JwtConfig, RateLimitConfig, TokenType};
use gauth_core::seed::SeedOptions;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

/// Signing secret used by every test application.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// bcrypt cost for tests; the minimum keeps hashing fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Password given to users created through the harness.
pub const TEST_PASSWORD: &str = "s3cret-pass";

/// `{"alg":"none","typ":"JWT"}`, base64url encoded.
const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

// =============================================================================
// Configuration Fixtures
// =============================================================================

/// Pre-built API configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default test configuration: rate limiting off, audit on.
    pub fn api() -> ApiConfig {
        ApiConfig::default()
            .with_jwt(JwtConfig::new(TEST_JWT_SECRET))
            .with_bcrypt_cost(TEST_BCRYPT_COST)
            .with_rate_limit(RateLimitConfig::disabled())
    }

    /// Test configuration admitting `max_requests` per `window` per client.
    pub fn rate_limited(max_requests: u32, window: Duration) -> ApiConfig {
        Self::api().with_rate_limit(RateLimitConfig::per_window(max_requests, window))
    }

    /// Test configuration with auditing disabled.
    pub fn unaudited() -> ApiConfig {
        Self::api().with_audit(AuditConfig::disabled())
    }

    /// Test configuration with short token lifetimes.
    pub fn short_lived(access: Duration, refresh: Duration) -> ApiConfig {
        Self::api().with_jwt(
            JwtConfig::new(TEST_JWT_SECRET)
                .with_access_expiration(access)
                .with_refresh_expiration(refresh),
        )
    }

    /// A minimal YAML service configuration using the in-memory store.
    pub fn service_yaml() -> String {
        format!(
            r#"
server:
  port: 9443
  environment: test
  request_timeout: 5s
database:
  backend: memory
jwt:
  secret: {secret}
  access_expiration: 15m
  refresh_expiration: 2h
password:
  bcrypt_cost: {cost}
rate_limit:
  max_requests: 20
  window: 30s
audit:
  exclude_paths: ["/health", "/metrics"]
logging:
  level: debug
  format: json
"#,
            secret = TEST_JWT_SECRET,
            cost = TEST_BCRYPT_COST,
        )
    }
}

// =============================================================================
// Credential Fixtures
// =============================================================================

/// Credentials of the seeded administrator.
pub struct AdminFixtures;

impl AdminFixtures {
    /// Seeding options used by the harness.
    pub fn seed_options() -> SeedOptions {
        SeedOptions::default()
    }

    /// Administrator login name.
    pub fn username() -> String {
        Self::seed_options().admin_username
    }

    /// Administrator email.
    pub fn email() -> String {
        Self::seed_options().admin_email
    }

    /// Administrator password.
    pub fn password() -> String {
        Self::seed_options().admin_password
    }
}

// =============================================================================
// Token Fixtures
// =============================================================================

/// Hand-crafted tokens for negative authentication tests.
pub struct TokenFixtures;

impl TokenFixtures {
    /// Signs claims for `session_token` with the given algorithm and secret.
    pub fn sign(
        algorithm: Algorithm,
        secret: &str,
        user_id: Uuid,
        session_token: &str,
        token_type: TokenType,
    ) -> String {
        let claims = Claims::new(user_id, session_token, token_type, Duration::from_secs(3600));
        encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to sign test token")
    }

    /// Signs an access token with HS512 and the real secret.
    pub fn hs512_access(user_id: Uuid, session_token: &str) -> String {
        Self::sign(
            Algorithm::HS512,
            TEST_JWT_SECRET,
            user_id,
            session_token,
            TokenType::Access,
        )
    }

    /// Signs an access token with HS256 and a different secret.
    pub fn foreign_secret_access(user_id: Uuid, session_token: &str) -> String {
        Self::sign(
            Algorithm::HS256,
            "some-other-secret-that-is-also-long-enough",
            user_id,
            session_token,
            TokenType::Access,
        )
    }

    /// Rewrites a valid token as an unsigned `alg: none` token with the same
    /// claims.
    pub fn unsigned(token: &str) -> String {
        let payload = token.split('.').nth(1).expect("token has a payload segment");
        format!("{}.{}.", NONE_HEADER, payload)
    }

    /// Decodes claims from a token minted by the test application.
    pub fn claims(token: &str, token_type: TokenType) -> Claims {
        gauth_api::JwtManager::new(JwtConfig::new(TEST_JWT_SECRET))
            .expect("Failed to create JWT manager")
            .validate_token(token, token_type)
            .expect("Token should validate")
    }
}
