// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed permissions and role names.
//!
//! Roles are persisted with their permissions serialized as a JSON array of
//! strings such as `"user:read"`. Those strings are parsed into [`Permission`]
//! at the store boundary so authorization checks never compare raw strings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Fine-grained permissions grantable through roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // =========================================================================
    // User Permissions
    // =========================================================================
    /// Create user accounts.
    #[serde(rename = "user:create")]
    UserCreate,
    /// List and read user accounts.
    #[serde(rename = "user:read")]
    UserRead,
    /// Update user accounts.
    #[serde(rename = "user:update")]
    UserUpdate,
    /// Delete user accounts.
    #[serde(rename = "user:delete")]
    UserDelete,

    // =========================================================================
    // Role Permissions
    // =========================================================================
    /// Create roles.
    #[serde(rename = "role:create")]
    RoleCreate,
    /// Read roles.
    #[serde(rename = "role:read")]
    RoleRead,
    /// Update roles.
    #[serde(rename = "role:update")]
    RoleUpdate,
    /// Delete roles.
    #[serde(rename = "role:delete")]
    RoleDelete,

    // =========================================================================
    // Policy Permissions
    // =========================================================================
    /// Create policies.
    #[serde(rename = "policy:create")]
    PolicyCreate,
    /// Read policies.
    #[serde(rename = "policy:read")]
    PolicyRead,
    /// Update policies.
    #[serde(rename = "policy:update")]
    PolicyUpdate,
    /// Delete policies.
    #[serde(rename = "policy:delete")]
    PolicyDelete,

    // =========================================================================
    // Self-service Permissions
    // =========================================================================
    /// Read the audit trail.
    #[serde(rename = "audit:read")]
    AuditRead,
    /// Read one's own profile.
    #[serde(rename = "profile:read")]
    ProfileRead,
    /// Update one's own profile.
    #[serde(rename = "profile:update")]
    ProfileUpdate,
}

impl Permission {
    /// Returns the permission name as stored in role records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserCreate => "user:create",
            Permission::UserRead => "user:read",
            Permission::UserUpdate => "user:update",
            Permission::UserDelete => "user:delete",
            Permission::RoleCreate => "role:create",
            Permission::RoleRead => "role:read",
            Permission::RoleUpdate => "role:update",
            Permission::RoleDelete => "role:delete",
            Permission::PolicyCreate => "policy:create",
            Permission::PolicyRead => "policy:read",
            Permission::PolicyUpdate => "policy:update",
            Permission::PolicyDelete => "policy:delete",
            Permission::AuditRead => "audit:read",
            Permission::ProfileRead => "profile:read",
            Permission::ProfileUpdate => "profile:update",
        }
    }

    /// Parses a permission from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == s)
    }

    /// Returns all available permissions.
    pub fn all() -> &'static [Permission] {
        &[
            Permission::UserCreate,
            Permission::UserRead,
            Permission::UserUpdate,
            Permission::UserDelete,
            Permission::RoleCreate,
            Permission::RoleRead,
            Permission::RoleUpdate,
            Permission::RoleDelete,
            Permission::PolicyCreate,
            Permission::PolicyRead,
            Permission::PolicyUpdate,
            Permission::PolicyDelete,
            Permission::AuditRead,
            Permission::ProfileRead,
            Permission::ProfileUpdate,
        ]
    }

    /// Returns the resource part of the name (`"user"` for `user:read`).
    pub fn category(&self) -> &'static str {
        match self {
            Permission::UserCreate
            | Permission::UserRead
            | Permission::UserUpdate
            | Permission::UserDelete => "user",
            Permission::RoleCreate
            | Permission::RoleRead
            | Permission::RoleUpdate
            | Permission::RoleDelete => "role",
            Permission::PolicyCreate
            | Permission::PolicyRead
            | Permission::PolicyUpdate
            | Permission::PolicyDelete => "policy",
            Permission::AuditRead => "audit",
            Permission::ProfileRead | Permission::ProfileUpdate => "profile",
        }
    }

    /// Returns `true` for permissions that manage other principals.
    pub fn is_admin(&self) -> bool {
        !matches!(self, Permission::ProfileRead | Permission::ProfileUpdate)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// A set of permissions, typically the union across a user's roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a permission set from a list of permissions.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Parses stored permission names, skipping unknown ones.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let parsed = Permission::parse(name);
                if parsed.is_none() {
                    tracing::warn!(permission = name, "Ignoring unknown permission");
                }
                parsed
            })
            .collect()
    }

    /// Adds a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Returns `true` if the set contains the given permission.
    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns `true` if the set contains all of the given permissions.
    pub fn contains_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.permissions.contains(p))
    }

    /// Returns `true` if the set contains any of the given permissions.
    pub fn contains_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Returns the number of permissions in the set.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Returns an iterator over the permissions.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Merges another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().copied());
    }

    /// Returns the permission names in a stable order.
    pub fn to_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.permissions.iter().map(|p| p.to_string()).collect();
        names.sort();
        names
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self::from_permissions(iter)
    }
}

// =============================================================================
// Role
// =============================================================================

/// Role names recognized by the authorization gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full user management access.
    Admin,
    /// Self-service access to one's own profile.
    User,
    /// Any other role stored in the database.
    #[serde(untagged)]
    Custom(String),
}

impl Role {
    /// Returns the stored role name.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Custom(name) => name,
        }
    }

    /// Parses a role name. Unrecognized names become `Custom`.
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "user" => Role::User,
            other => Role::Custom(other.to_string()),
        }
    }

    /// Returns the permissions granted to this role when seeded.
    pub fn default_permissions(&self) -> PermissionSet {
        match self {
            Role::Admin => Permission::all()
                .iter()
                .copied()
                .filter(Permission::is_admin)
                .collect(),
            Role::User => {
                PermissionSet::from_permissions([Permission::ProfileRead, Permission::ProfileUpdate])
            }
            Role::Custom(_) => PermissionSet::new(),
        }
    }

    /// Returns the seeded description.
    pub fn description(&self) -> &str {
        match self {
            Role::Admin => "Administrator with full access",
            Role::User => "Regular user with basic access",
            Role::Custom(_) => "",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_as_str() {
        assert_eq!(Permission::UserRead.as_str(), "user:read");
        assert_eq!(Permission::AuditRead.as_str(), "audit:read");
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::parse("user:delete"), Some(Permission::UserDelete));
        assert_eq!(Permission::parse("user:admin"), None);
        for p in Permission::all() {
            assert_eq!(Permission::parse(p.as_str()), Some(*p));
        }
    }

    #[test]
    fn test_permission_serde_uses_stored_names() {
        let json = serde_json::to_string(&Permission::PolicyUpdate).unwrap();
        assert_eq!(json, "\"policy:update\"");
        let parsed: Vec<Permission> =
            serde_json::from_str(r#"["profile:read","role:create"]"#).unwrap();
        assert_eq!(parsed, vec![Permission::ProfileRead, Permission::RoleCreate]);
    }

    #[test]
    fn test_permission_set_from_names_skips_unknown() {
        let set = PermissionSet::from_names(["user:read", "bogus", "audit:read"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::UserRead));
        assert!(set.contains(Permission::AuditRead));
    }

    #[test]
    fn test_permission_set() {
        let mut set = PermissionSet::new();
        set.add(Permission::UserRead);
        set.add(Permission::UserUpdate);

        assert!(set.contains(Permission::UserRead));
        assert!(!set.contains(Permission::UserDelete));
        assert!(set.contains_all(&[Permission::UserRead, Permission::UserUpdate]));
        assert!(!set.contains_all(&[Permission::UserRead, Permission::UserDelete]));
        assert!(set.contains_any(&[Permission::UserDelete, Permission::UserUpdate]));
    }

    #[test]
    fn test_role_default_permissions() {
        let admin = Role::Admin.default_permissions();
        assert_eq!(admin.len(), 13);
        assert!(admin.contains(Permission::AuditRead));
        assert!(!admin.contains(Permission::ProfileRead));

        let user = Role::User.default_permissions();
        assert_eq!(
            user.to_names(),
            vec!["profile:read".to_string(), "profile:update".to_string()]
        );
        assert!(Role::Custom("auditor".into()).default_permissions().is_empty());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("auditor"), Role::Custom("auditor".into()));
        assert_eq!(Role::Custom("auditor".into()).as_str(), "auditor");
    }
}
