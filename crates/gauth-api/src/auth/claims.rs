// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
}

impl TokenType {
    /// Returns the claim value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims for authentication.
///
/// Every token is bound to a server-side session through `session_token`;
/// the signature alone never proves the session is still live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user.
    pub user_id: Uuid,

    /// Opaque token of the session this token was minted for.
    pub session_token: String,

    /// Access or refresh.
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,
}

impl Claims {
    /// Creates claims that expire `ttl` from now.
    pub fn new(
        user_id: Uuid,
        session_token: impl Into<String>,
        token_type: TokenType,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        Self {
            user_id,
            session_token: session_token.into(),
            token_type,
            exp: now.saturating_add(ttl),
            iat: now,
        }
    }

    /// Returns `true` if this is an access token.
    pub fn is_access(&self) -> bool {
        self.token_type == TokenType::Access
    }

    /// Returns `true` if this is a refresh token.
    pub fn is_refresh(&self) -> bool {
        self.token_type == TokenType::Refresh
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_lifetime() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "session",
            TokenType::Access,
            Duration::from_secs(3600),
        );

        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.is_access());
        assert!(!claims.is_refresh());
        assert!(claims.expires_at().is_some());
    }

    #[test]
    fn test_claims_wire_format() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "abc", TokenType::Refresh, Duration::from_secs(60));
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["type"], "refresh");
        assert_eq!(json["session_token"], "abc");
        assert_eq!(json["user_id"], user_id.to_string());
        assert!(json.get("exp").is_some());
        assert!(json.get("iat").is_some());
    }

    #[test]
    fn test_missing_session_token_rejected() {
        let json = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "type": "access",
            "exp": 0,
            "iat": 0,
        });
        assert!(serde_json::from_value::<Claims>(json).is_err());
    }
}
