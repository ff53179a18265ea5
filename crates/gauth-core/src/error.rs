// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for credential store operations.

use thiserror::Error;

use crate::password::PasswordError;

/// Errors returned by [`CredentialStore`](crate::store::CredentialStore)
/// implementations and the seeding routines built on top of them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity does not exist (or is soft-deleted).
    #[error("{entity} not found")]
    NotFound {
        /// Entity kind, e.g. `"user"`.
        entity: &'static str,
    },

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    /// The backing database returned an error.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A stored JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Password hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The store is unreachable or misconfigured.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Returns `true` for not found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for uniqueness violations.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row" },
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or("unique constraint").to_string();
                Self::Conflict(format!("Duplicate value violates {}", constraint))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::not_found("user").is_not_found());
        assert!(StoreError::conflict("taken").is_conflict());
        assert!(!StoreError::conflict("taken").is_not_found());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::not_found("user").to_string(), "user not found");
        assert_eq!(
            StoreError::conflict("Username already exists").to_string(),
            "Username already exists"
        );
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
