// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access policies.
//!
//! Policies are stored and listed but not evaluated on the request path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Policy effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    /// Grant access.
    #[default]
    Allow,
    /// Deny access.
    Deny,
}

impl PolicyEffect {
    /// Returns the stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyEffect::Allow => "allow",
            PolicyEffect::Deny => "deny",
        }
    }

    /// Parses a stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(PolicyEffect::Allow),
            "deny" => Some(PolicyEffect::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted resource/action policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique policy name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Resource pattern, e.g. `users`.
    pub resource: String,
    /// Action pattern, e.g. `read`.
    pub action: String,
    /// Allow or deny.
    pub effect: PolicyEffect,
    /// Free-form conditions object.
    pub conditions: serde_json::Map<String, serde_json::Value>,
    /// Inactive policies are ignored.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a policy.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPolicy {
    /// Unique policy name.
    pub name: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
    /// Resource pattern.
    pub resource: String,
    /// Action pattern.
    pub action: String,
    /// Allow or deny.
    #[serde(default)]
    pub effect: PolicyEffect,
    /// Free-form conditions object.
    #[serde(default)]
    pub conditions: serde_json::Map<String, serde_json::Value>,
}
