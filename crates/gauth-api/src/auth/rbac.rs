// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access rules for role and permission checks.

use std::fmt;

use gauth_core::{Permission, Role};

use super::AuthContext;

/// A requirement an authenticated identity must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// The identity must hold this role.
    Role(Role),
    /// The identity must hold this permission.
    Permission(Permission),
    /// The identity must hold every listed permission.
    AllPermissions(Vec<Permission>),
    /// The identity must hold at least one listed permission.
    AnyPermission(Vec<Permission>),
}

impl AccessRule {
    /// Returns `true` if `ctx` satisfies the rule.
    pub fn is_satisfied_by(&self, ctx: &AuthContext) -> bool {
        match self {
            AccessRule::Role(role) => ctx.has_role(role),
            AccessRule::Permission(permission) => ctx.has_permission(*permission),
            AccessRule::AllPermissions(permissions) => ctx.has_all_permissions(permissions),
            AccessRule::AnyPermission(permissions) => ctx.has_any_permission(permissions),
        }
    }
}

impl fmt::Display for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |permissions: &[Permission]| {
            permissions
                .iter()
                .map(Permission::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            AccessRule::Role(role) => write!(f, "role {}", role),
            AccessRule::Permission(permission) => write!(f, "permission {}", permission),
            AccessRule::AllPermissions(permissions) => write!(f, "all of [{}]", join(permissions)),
            AccessRule::AnyPermission(permissions) => write!(f, "any of [{}]", join(permissions)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gauth_core::PermissionSet;
    use std::sync::Arc;
    use uuid::Uuid;

    fn ctx(roles: Vec<Role>, permissions: &[Permission]) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "bob".to_string(),
            session_token: "t".to_string(),
            roles,
            permissions: Arc::new(PermissionSet::from_permissions(permissions.iter().copied())),
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    #[test]
    fn test_role_rule() {
        let rule = AccessRule::Role(Role::Admin);
        assert!(rule.is_satisfied_by(&ctx(vec![Role::Admin], &[])));
        assert!(!rule.is_satisfied_by(&ctx(vec![Role::User], &[])));
        assert!(!rule.is_satisfied_by(&ctx(vec![Role::Custom("admins".into())], &[])));
    }

    #[test]
    fn test_permission_rules() {
        let identity = ctx(vec![], &[Permission::UserRead]);

        assert!(AccessRule::Permission(Permission::UserRead).is_satisfied_by(&identity));
        assert!(!AccessRule::AllPermissions(vec![Permission::UserRead, Permission::UserDelete])
            .is_satisfied_by(&identity));
        assert!(AccessRule::AnyPermission(vec![Permission::UserRead, Permission::UserDelete])
            .is_satisfied_by(&identity));
        assert!(!AccessRule::AnyPermission(vec![]).is_satisfied_by(&identity));
    }

    #[test]
    fn test_display() {
        let rule = AccessRule::AllPermissions(vec![Permission::UserRead, Permission::AuditRead]);
        assert_eq!(rule.to_string(), "all of [user:read, audit:read]");
    }
}
