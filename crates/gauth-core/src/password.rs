// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing with bcrypt.
//!
//! Hashing is CPU bound, so the async variants move the work onto tokio's
//! blocking pool instead of stalling the request executor.

use thiserror::Error;

/// Password hashing errors.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// bcrypt rejected the input or the stored hash.
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// The blocking task was cancelled or panicked.
    #[error("Password hashing task failed: {0}")]
    Task(String),
}

/// bcrypt hasher with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// Creates a hasher. The cost is clamped to bcrypt's supported range.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    /// Returns the work factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes a plaintext password.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// A malformed stored hash is reported as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Hashes on the blocking thread pool.
    pub async fn hash_async(&self, password: String) -> Result<String, PasswordError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verifies on the blocking thread pool.
    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool, PasswordError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("secret123").unwrap();

        assert_ne!(hash, "secret123");
        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("secret123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_cost_is_clamped() {
        assert_eq!(PasswordHasher::new(1).cost(), 4);
        assert_eq!(PasswordHasher::new(40).cost(), 31);
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash_async("password".to_string()).await.unwrap();
        assert!(hasher
            .verify_async("password".to_string(), hash)
            .await
            .unwrap());
    }
}
