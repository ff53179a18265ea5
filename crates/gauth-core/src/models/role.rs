// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{Permission, PermissionSet, Role};

/// A persisted role with its granted permission names.
///
/// `permissions` is stored as a JSON array and is never null: a role without
/// grants holds `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique role name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Granted permission names.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Inactive roles grant nothing.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl RoleRecord {
    /// Returns the typed role name.
    pub fn role(&self) -> Role {
        Role::parse(&self.name)
    }

    /// Parses the stored permission names.
    pub fn permission_set(&self) -> PermissionSet {
        PermissionSet::from_names(&self.permissions)
    }

    /// Returns `true` if this role grants `permission`.
    pub fn grants(&self, permission: Permission) -> bool {
        self.is_active && self.permission_set().contains(permission)
    }
}

/// Input for creating a role.
#[derive(Debug, Clone)]
pub struct NewRole {
    /// Unique role name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Granted permissions.
    pub permissions: PermissionSet,
}

impl NewRole {
    /// Creates a role input from a typed role and its default grants.
    pub fn from_role(role: &Role) -> Self {
        Self {
            name: role.as_str().to_string(),
            description: role.description().to_string(),
            permissions: role.default_permissions(),
        }
    }

    /// Returns the permission names to persist.
    pub fn permission_names(&self) -> Vec<String> {
        self.permissions.to_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_record_permissions() {
        let now = Utc::now();
        let mut record = RoleRecord {
            id: Uuid::now_v7(),
            name: "user".into(),
            description: String::new(),
            permissions: vec!["profile:read".into(), "unknown:thing".into()],
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(record.role(), Role::User);
        assert_eq!(record.permission_set().len(), 1);
        assert!(record.grants(Permission::ProfileRead));

        record.is_active = false;
        assert!(!record.grants(Permission::ProfileRead));
    }

    #[test]
    fn test_empty_permissions_serialize_as_array() {
        let now = Utc::now();
        let record = RoleRecord {
            id: Uuid::now_v7(),
            name: "empty".into(),
            description: String::new(),
            permissions: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["permissions"], serde_json::json!([]));
    }

    #[test]
    fn test_new_role_from_role() {
        let new_role = NewRole::from_role(&Role::User);
        assert_eq!(new_role.name, "user");
        assert_eq!(new_role.permission_names(), vec!["profile:read", "profile:update"]);
    }
}
