// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit logger for testing and development.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::types::{AuditFilter, AuditLog};
use super::{AuditLogger, AuditResult};

/// In-memory audit logger.
///
/// Entries are kept in a `RwLock`-protected vector. When `max_entries` is
/// non-zero the oldest entries are dropped once the limit is reached.
#[derive(Debug, Clone)]
pub struct InMemoryAuditLogger {
    logs: Arc<RwLock<Vec<AuditLog>>>,
    max_entries: usize,
}

impl Default for InMemoryAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditLogger {
    /// Creates a logger with unlimited capacity.
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(Vec::new())),
            max_entries: 0,
        }
    }

    /// Creates a logger that keeps at most `max_entries` entries.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(Vec::with_capacity(max_entries.min(10_000)))),
            max_entries,
        }
    }

    /// Returns all entries in insertion order.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.logs.read().clone()
    }

    /// Returns entries matching a predicate.
    pub fn entries_where<F>(&self, predicate: F) -> Vec<AuditLog>
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).cloned().collect()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.logs.write().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Returns `true` if no entries were logged.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut logs = self.logs.write();
        if self.max_entries > 0 && logs.len() >= self.max_entries {
            let overflow = logs.len() + 1 - self.max_entries;
            logs.drain(..overflow);
        }
        logs.push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let logs = self.logs.read();
        let matched = logs.iter().rev().filter(|entry| filter.matches(entry)).cloned();
        Ok(match filter.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}
