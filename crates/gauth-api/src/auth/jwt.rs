// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT token management.
//!
//! Tokens are always signed with HS256 and validation accepts nothing else:
//! a token whose header names any other algorithm is rejected before its
//! signature is looked at.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Claims, TokenType};
use crate::error::{ApiError, ApiResult};

/// The only accepted signing algorithm.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// JwtConfig
// =============================================================================

/// JWT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Shared secret for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_expiration: Duration,
    /// Refresh token (and session) lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_expiration: Duration,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_expiration: Duration::from_secs(24 * 3600),
            refresh_expiration: Duration::from_secs(7 * 24 * 3600),
            leeway_secs: 0,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the access token lifetime.
    pub fn with_access_expiration(mut self, duration: Duration) -> Self {
        self.access_expiration = duration;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_expiration(mut self, duration: Duration) -> Self {
        self.refresh_expiration = duration;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// JwtManager
// =============================================================================

/// Manager for JWT token operations.
#[derive(Clone)]
pub struct JwtManager {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtManager {
    /// Creates a new JWT manager with the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Signs the given claims.
    pub fn create_token(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Creates an access token bound to a session.
    pub fn create_access_token(&self, user_id: Uuid, session_token: &str) -> ApiResult<String> {
        let claims = Claims::new(
            user_id,
            session_token,
            TokenType::Access,
            self.config.access_expiration,
        );
        self.create_token(&claims)
    }

    /// Creates a refresh token bound to a session.
    pub fn create_refresh_token(&self, user_id: Uuid, session_token: &str) -> ApiResult<String> {
        let claims = Claims::new(
            user_id,
            session_token,
            TokenType::Refresh,
            self.config.refresh_expiration,
        );
        self.create_token(&claims)
    }

    /// Validates the signature and expiry of a token and checks its type.
    ///
    /// Every failure yields the same generic unauthorized error; the cause
    /// is only logged.
    pub fn validate_token(&self, token: &str, expected: TokenType) -> ApiResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("Token has expired"),
                ErrorKind::InvalidAlgorithm => tracing::debug!("Token uses a rejected algorithm"),
                ErrorKind::InvalidSignature => tracing::debug!("Token signature mismatch"),
                _ => tracing::debug!(error = %e, "Token validation failed"),
            }
            ApiError::invalid_token()
        })?;

        if data.claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %data.claims.token_type,
                "Token type mismatch"
            );
            return Err(ApiError::invalid_token());
        }

        Ok(data.claims)
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_expiration_secs(&self) -> i64 {
        i64::try_from(self.config.access_expiration.as_secs()).unwrap_or(i64::MAX)
    }

    /// Returns the refresh token lifetime.
    pub fn refresh_expiration(&self) -> Duration {
        self.config.refresh_expiration
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("algorithm", &ALGORITHM)
            .field("access_expiration", &self.config.access_expiration)
            .field("refresh_expiration", &self.config.refresh_expiration)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn manager() -> JwtManager {
        JwtManager::new(JwtConfig::new(SECRET)).unwrap()
    }

    #[test]
    fn test_create_and_validate_token() {
        let manager = manager();
        let user_id = Uuid::new_v4();

        let token = manager.create_access_token(user_id, "session-1").unwrap();
        let claims = manager.validate_token(&token, TokenType::Access).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.session_token, "session-1");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_type_enforced() {
        let manager = manager();
        let refresh = manager.create_refresh_token(Uuid::new_v4(), "s").unwrap();

        assert!(manager.validate_token(&refresh, TokenType::Access).is_err());
        assert!(manager.validate_token(&refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token() {
        let manager = manager();
        let mut claims = Claims::new(Uuid::new_v4(), "s", TokenType::Access, Duration::ZERO);
        claims.exp -= 3600;
        let token = manager.create_token(&claims).unwrap();

        assert!(manager.validate_token(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_other_algorithms_rejected() {
        let manager = manager();
        let claims = Claims::new(
            Uuid::new_v4(),
            "s",
            TokenType::Access,
            Duration::from_secs(60),
        );

        for algorithm in [Algorithm::HS384, Algorithm::HS512] {
            let token = encode(
                &Header::new(algorithm),
                &claims,
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap();
            assert!(manager.validate_token(&token, TokenType::Access).is_err());
        }
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtManager::new(JwtConfig::new("another-secret-for-testing-purposes")).unwrap();
        let token = other.create_access_token(Uuid::new_v4(), "s").unwrap();

        assert!(manager().validate_token(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_garbage_token() {
        let err = manager()
            .validate_token("invalid.token.here", TokenType::Access)
            .unwrap_err();
        assert_eq!(err.user_message(), crate::error::INVALID_TOKEN);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtManager::new(JwtConfig::default()).is_err());
    }
}
