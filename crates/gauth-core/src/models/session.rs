// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login sessions.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A server-side login session.
///
/// Tokens embed the opaque `token`; a request is only authenticated while the
/// matching row is active and unexpired, which makes this record the source
/// of truth for revocation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Opaque bearer token embedded in JWT claims.
    #[serde(skip_serializing)]
    pub token: String,
    /// Hard expiry of the session.
    pub expires_at: DateTime<Utc>,
    /// Client address at login.
    pub ip_address: String,
    /// Client user agent at login.
    pub user_agent: String,
    /// Cleared on logout.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` if the session expired at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns `true` if the session can still authenticate requests.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Owning user.
    pub user_id: Uuid,
    /// Opaque token.
    pub token: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
    /// Client address.
    pub ip_address: String,
    /// Client user agent.
    pub user_agent: String,
}

impl NewSession {
    /// Creates a session with a fresh random token that expires after `ttl`.
    pub fn issue(user_id: Uuid, ttl: Duration) -> Self {
        Self {
            user_id,
            token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + ttl,
            ip_address: String::new(),
            user_agent: String::new(),
        }
    }

    /// Records the originating client.
    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_generates_unique_tokens() {
        let user_id = Uuid::now_v7();
        let a = NewSession::issue(user_id, Duration::hours(1));
        let b = NewSession::issue(user_id, Duration::hours(1));
        assert_ne!(a.token, b.token);
        assert!(a.expires_at > Utc::now());
    }

    #[test]
    fn test_session_validity() {
        let now = Utc::now();
        let mut session = Session {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            token: "t".into(),
            expires_at: now + Duration::minutes(5),
            ip_address: String::new(),
            user_agent: String::new(),
            is_active: true,
            created_at: now,
        };
        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + Duration::minutes(5)));

        session.is_active = false;
        assert!(!session.is_valid_at(now));
    }
}
