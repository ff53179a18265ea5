// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use gauth_core::{Permission, PermissionSet, Role, UserWithRoles};
use serde::Serialize;
use uuid::Uuid;

/// Identity resolved for an authenticated request.
///
/// Inserted into the request extensions by the authentication middleware
/// and handed to handlers through the [`Auth`](crate::extractors::Auth)
/// extractor.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// User ID.
    pub user_id: Uuid,
    /// Login name.
    pub username: String,
    /// Token of the session the bearer token is bound to.
    #[serde(skip)]
    pub session_token: String,
    /// Names of the user's roles.
    pub roles: Vec<Role>,
    /// Union of permissions across the user's active roles.
    #[serde(skip)]
    pub permissions: Arc<PermissionSet>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Builds the context for a user authenticated through `session_token`.
    pub fn from_user(user: &UserWithRoles, session_token: impl Into<String>) -> Self {
        Self {
            user_id: user.user.id,
            username: user.user.username.clone(),
            session_token: session_token.into(),
            roles: user.role_names(),
            permissions: Arc::new(user.permissions()),
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns `true` if the context has any of the given roles.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Returns `true` if the context has the given permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the context has all of the given permissions.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_all(permissions)
    }

    /// Returns `true` if the context has any of the given permissions.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_any(permissions)
    }

    /// Returns `true` if this context holds the `admin` role.
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }
}

// =============================================================================
// Tests
// =============================================================================
