// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Append-only audit trail.
//!
//! Every HTTP request produces one [`AuditLog`] describing who did what and
//! whether it succeeded. Writers implement [`AuditLogger`]; the API layer
//! calls them from detached tasks so a failing writer never affects the
//! request that triggered it.
//!
//! # Components
//!
//! - [`AuditLogger`]: Core trait for audit sinks
//! - [`AuditLog`]: A single audit record
//! - [`AuditFilter`]: Query filter for loggers that support reading back
//! - [`InMemoryAuditLogger`]: Vector-backed logger for tests and development
//! - [`NoOpAuditLogger`]: Discards everything
//!
//! The PostgreSQL store also implements [`AuditLogger`], writing to the
//! `audit_logs` table.

mod memory_logger;
mod types;

pub use memory_logger::InMemoryAuditLogger;
pub use types::{AuditFilter, AuditLog};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::StoreError;

/// Audit write or query failure.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The underlying store failed.
    #[error("Audit storage error: {0}")]
    Storage(#[from] StoreError),

    /// The logger cannot read entries back.
    #[error("Logger '{0}' does not support queries")]
    QueryNotSupported(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

// =============================================================================
// Core Trait
// =============================================================================

/// Trait for audit sinks.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Persists one entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Persists several entries. Defaults to calling `log` for each.
    async fn log_batch(&self, entries: Vec<AuditLog>) -> AuditResult<()> {
        for entry in entries {
            self.log(entry).await?;
        }
        Ok(())
    }

    /// Reads entries back, newest first.
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Flushes buffered entries.
    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// An audit logger that discards all entries.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a new no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::QueryNotSupported(self.name().to_string()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_logger() {
        let logger = NoOpAuditLogger::new();
        logger
            .log(AuditLog::new("GET", "/api/users"))
            .await
            .unwrap();
        assert!(logger.query(AuditFilter::new()).await.is_err());
        assert!(!logger.supports_query());
        assert_eq!(logger.name(), "noop");
    }
}
