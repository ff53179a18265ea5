// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session issuing and bearer token authentication.
//!
//! [`SessionIssuer`] owns the login flow and the checks every bearer token
//! goes through: a valid HS256 signature, the expected token type, and a live
//! session row that has neither been logged out nor expired. The session row
//! is what makes logout effective before token expiry.

use std::sync::Arc;

use chrono::Utc;
use gauth_core::{CredentialStore, NewSession, PasswordHasher, UserWithRoles};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{Claims, JwtManager, TokenType};
use crate::error::{ApiError, ApiResult};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Plaintext behind the decoy hash checked for unknown logins.
const DECOY_PASSWORD: &str = "gauth-decoy-credential";

// =============================================================================
// ClientInfo
// =============================================================================

/// Originating client of a request, recorded on new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Client IP address as text.
    pub ip_address: String,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientInfo {
    /// Creates client info.
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
        }
    }
}

// =============================================================================
// TokenGrant
// =============================================================================

/// Tokens handed out by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenGrant {
    /// The authenticated user with roles; never includes the password hash.
    pub user: UserWithRoles,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

// =============================================================================
// SessionIssuer
// =============================================================================

/// Issues sessions and authenticates bearer tokens against them.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn CredentialStore>,
    jwt: Arc<JwtManager>,
    hasher: PasswordHasher,
    decoy_hash: Arc<OnceCell<String>>,
}

impl SessionIssuer {
    /// Creates a session issuer.
    pub fn new(store: Arc<dyn CredentialStore>, jwt: Arc<JwtManager>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            jwt,
            hasher,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Hash of [`DECOY_PASSWORD`] at the configured cost, computed once.
    async fn decoy_hash(&self) -> ApiResult<String> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash_async(DECOY_PASSWORD.to_string()))
            .await?;
        Ok(hash.clone())
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Authenticates a username or email with a password and opens a session.
    ///
    /// Unknown users, wrong passwords and inactive accounts fail with the
    /// same error.
    pub async fn login(&self, login: &str, password: &str, client: ClientInfo) -> ApiResult<TokenGrant> {
        let user = match self.store.find_user_by_login(login).await? {
            Some(user) => user,
            None => {
                // Unknown logins pay the same bcrypt cost as a wrong password.
                let decoy = self.decoy_hash().await?;
                self.hasher
                    .verify_async(password.to_string(), decoy)
                    .await?;
                debug!("Login failed: unknown user");
                return Err(ApiError::invalid_credentials());
            }
        };

        let matches = self
            .hasher
            .verify_async(password.to_string(), user.password_hash.clone())
            .await?;
        if !matches {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(ApiError::invalid_credentials());
        }
        if !user.is_active {
            debug!(user_id = %user.id, "Login failed: account inactive");
            return Err(ApiError::invalid_credentials());
        }

        let ttl = chrono::Duration::from_std(self.jwt.refresh_expiration())
            .map_err(|e| ApiError::internal(format!("Invalid session lifetime: {}", e)))?;
        let session = self
            .store
            .create_session(
                NewSession::issue(user.id, ttl).with_client(client.ip_address, client.user_agent),
            )
            .await?;

        let access_token = self.jwt.create_access_token(user.id, &session.token)?;
        let refresh_token = self.jwt.create_refresh_token(user.id, &session.token)?;

        self.store.touch_last_login(user.id).await?;
        let user = self
            .store
            .get_user_with_roles(user.id)
            .await?
            .ok_or_else(ApiError::invalid_credentials)?;

        info!(user_id = %user.user.id, username = %user.user.username, "User logged in");

        Ok(TokenGrant {
            user,
            access_token,
            refresh_token,
            expires_in: self.jwt.access_expiration_secs(),
        })
    }

    /// Validates a bearer token of the `expected` type against its session and
    /// loads the owning user.
    pub async fn authenticate(
        &self,
        token: &str,
        expected: TokenType,
    ) -> ApiResult<(Claims, UserWithRoles)> {
        let claims = self.jwt.validate_token(token, expected)?;

        let session = self
            .store
            .find_active_session(&claims.session_token, claims.user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %claims.user_id, "No active session for token");
                ApiError::invalid_token()
            })?;

        if session.is_expired_at(Utc::now()) {
            debug!(user_id = %claims.user_id, "Session expired");
            return Err(ApiError::invalid_token());
        }

        let user = self
            .store
            .get_user_with_roles(claims.user_id)
            .await?
            .filter(|u| u.user.is_active)
            .ok_or_else(|| {
                debug!(user_id = %claims.user_id, "Token owner missing or inactive");
                ApiError::invalid_token()
            })?;

        Ok((claims, user))
    }

    /// Mints a new access token for the session behind `refresh_token`.
    ///
    /// The refresh token itself is returned unchanged and no new session is
    /// created.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenGrant> {
        let (claims, user) = self.authenticate(refresh_token, TokenType::Refresh).await?;
        let access_token = self
            .jwt
            .create_access_token(claims.user_id, &claims.session_token)?;

        debug!(user_id = %claims.user_id, "Access token refreshed");

        Ok(TokenGrant {
            user,
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.jwt.access_expiration_secs(),
        })
    }

    /// Marks the session inactive, revoking every token bound to it.
    pub async fn logout(&self, user_id: Uuid, session_token: &str) -> ApiResult<()> {
        if self.store.deactivate_session(session_token).await? {
            info!(user_id = %user_id, "User logged out");
        } else {
            debug!(user_id = %user_id, "Session was already inactive");
        }
        Ok(())
    }

    /// Replaces a user's password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let matches = self
            .hasher
            .verify_async(current_password.to_string(), user.password_hash.clone())
            .await?;
        if !matches {
            return Err(ApiError::unauthorized("Current password is incorrect"));
        }

        let hash = self.hasher.hash_async(new_password.to_string()).await?;
        self.store.set_password_hash(user_id, &hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("store", &self.store.name())
            .field("jwt", &self.jwt)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use gauth_core::{MemoryStore, NewUser, UserChanges};

    const SECRET: &str = "session-test-secret-that-is-long-enough";

    struct Fixture {
        store: Arc<MemoryStore>,
        issuer: SessionIssuer,
        user_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("secret1").unwrap();
        let user = store
            .create_user(NewUser::new("alice", "alice@example.com", hash))
            .await
            .unwrap();

        let jwt = Arc::new(JwtManager::new(JwtConfig::new(SECRET)).unwrap());
        let issuer = SessionIssuer::new(store.clone(), jwt, hasher);
        Fixture {
            store,
            issuer,
            user_id: user.id,
        }
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let f = fixture().await;

        let grant = f
            .issuer
            .login("alice", "secret1", ClientInfo::new("10.0.0.1", "curl"))
            .await
            .unwrap();
        assert_eq!(grant.user.user.id, f.user_id);
        assert_eq!(grant.expires_in, 86400);
        assert!(grant.user.user.last_login_at.is_some());

        let grant = f
            .issuer
            .login("alice@example.com", "secret1", ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(grant.user.user.username, "alice");
        assert_eq!(f.store.session_count(), 2);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture().await;
        f.store
            .create_user(NewUser::new(
                "bob",
                "bob@example.com",
                PasswordHasher::new(4).hash("secret1").unwrap(),
            ).active(false))
            .await
            .unwrap();

        let unknown = f.issuer.login("nobody", "secret1", ClientInfo::default()).await;
        let wrong = f.issuer.login("alice", "wrong-pass", ClientInfo::default()).await;
        let inactive = f.issuer.login("bob", "secret1", ClientInfo::default()).await;

        for result in [unknown, wrong, inactive] {
            let err = result.unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
            assert_eq!(err.user_message(), "Invalid credentials");
        }
        assert_eq!(f.store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_login_checks_decoy_hash() {
        let f = fixture().await;
        assert!(f.issuer.decoy_hash.get().is_none());

        let err = f
            .issuer
            .login("ghost@example.com", "secret1", ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");

        // The decoy is a real hash at the configured cost.
        let decoy = f.issuer.decoy_hash.get().cloned().unwrap();
        assert!(decoy.starts_with("$2b$04$"));
        assert!(f.issuer.hasher.verify(DECOY_PASSWORD, &decoy));

        // Later misses reuse it.
        f.issuer.login("ghost", "secret1", ClientInfo::default()).await.unwrap_err();
        assert_eq!(f.issuer.decoy_hash.get(), Some(&decoy));
    }

    #[tokio::test]
    async fn test_authenticate_and_logout() {
        let f = fixture().await;
        let grant = f
            .issuer
            .login("alice", "secret1", ClientInfo::default())
            .await
            .unwrap();

        let (claims, user) = f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(user.user.id, f.user_id);

        f.issuer.logout(f.user_id, &claims.session_token).await.unwrap();

        assert!(f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .is_err());
        assert!(f.issuer.refresh(&grant.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let f = fixture().await;
        let grant = f
            .issuer
            .login("alice", "secret1", ClientInfo::default())
            .await
            .unwrap();
        let (claims, _) = f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .unwrap();

        assert!(f
            .store
            .set_session_expiry(&claims.session_token, Utc::now() - chrono::Duration::seconds(1)));
        assert!(f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_deactivated_user_rejected() {
        let f = fixture().await;
        let grant = f
            .issuer
            .login("alice", "secret1", ClientInfo::default())
            .await
            .unwrap();

        f.store
            .update_user(
                f.user_id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_refresh_echoes_token_and_keeps_session() {
        let f = fixture().await;
        let grant = f
            .issuer
            .login("alice", "secret1", ClientInfo::default())
            .await
            .unwrap();

        let refreshed = f.issuer.refresh(&grant.refresh_token).await.unwrap();
        assert_eq!(refreshed.refresh_token, grant.refresh_token);
        assert_eq!(f.store.session_count(), 1);

        let (old, _) = f
            .issuer
            .authenticate(&grant.access_token, TokenType::Access)
            .await
            .unwrap();
        let (new, _) = f
            .issuer
            .authenticate(&refreshed.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(old.session_token, new.session_token);

        assert!(f.issuer.refresh(&grant.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_change_password() {
        let f = fixture().await;

        let err = f
            .issuer
            .change_password(f.user_id, "secret1", "short")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let err = f
            .issuer
            .change_password(f.user_id, "not-it", "new-secret")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Current password is incorrect");

        f.issuer
            .change_password(f.user_id, "secret1", "new-secret")
            .await
            .unwrap();
        assert!(f
            .issuer
            .login("alice", "new-secret", ClientInfo::default())
            .await
            .is_ok());
        assert!(f
            .issuer
            .login("alice", "secret1", ClientInfo::default())
            .await
            .is_err());
    }
}
