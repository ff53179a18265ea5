// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit record and filter types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// AuditLog
// =============================================================================

/// One audit record. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique identifier.
    pub id: Uuid,
    /// Time the record was created.
    pub created_at: DateTime<Utc>,
    /// Acting user, if the request was authenticated.
    pub user_id: Option<Uuid>,
    /// Action performed. For HTTP requests this is the method.
    pub action: String,
    /// Resource acted on. For HTTP requests this is the path.
    pub resource: String,
    /// Identifier of the specific resource, if any.
    pub resource_id: Option<String>,
    /// Free-form details object.
    pub details: serde_json::Value,
    /// Client address.
    pub ip_address: String,
    /// Client user agent.
    pub user_agent: String,
    /// Whether the action succeeded.
    pub success: bool,
}

impl AuditLog {
    /// Creates a successful record with empty details.
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            user_id: None,
            action: action.into(),
            resource: resource.into(),
            resource_id: None,
            details: serde_json::Value::Object(Default::default()),
            ip_address: String::new(),
            user_agent: String::new(),
            success: true,
        }
    }

    /// Creates a record for a completed HTTP request.
    ///
    /// `success` is derived from the status: anything below 400 succeeded.
    pub fn http_request(
        method: &str,
        path: &str,
        status: u16,
        duration_ms: u64,
        query: &str,
    ) -> Self {
        Self::new(method, path)
            .with_details(serde_json::json!({
                "status_code": status,
                "duration_ms": duration_ms,
                "query": query,
            }))
            .with_success(status < 400)
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the resource identifier.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Replaces the details object.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Records the client.
    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Returns the recorded HTTP status, if present.
    pub fn status_code(&self) -> Option<u16> {
        self.details
            .get("status_code")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
    }
}

// =============================================================================
// AuditFilter
// =============================================================================

/// Query filter for audit loggers. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Match the acting user.
    pub user_id: Option<Uuid>,
    /// Match the action exactly.
    pub action: Option<String>,
    /// Match the resource prefix.
    pub resource_prefix: Option<String>,
    /// Match the success flag.
    pub success: Option<bool>,
    /// Only records created at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Maximum records to return.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by user.
    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Filters by resource prefix.
    pub fn resource_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resource_prefix = Some(prefix.into());
        self
    }

    /// Filters by success flag.
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Filters by creation time.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `entry` passes every set criterion.
    pub fn matches(&self, entry: &AuditLog) -> bool {
        if let Some(user_id) = self.user_id {
            if entry.user_id != Some(user_id) {
                return false;
            }
        }
        if let Some(ref action) = self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(ref prefix) = self.resource_prefix {
            if !entry.resource.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(success) = self.success {
            if entry.success != success {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.created_at < since {
                return false;
            }
        }
        true
    }
}
