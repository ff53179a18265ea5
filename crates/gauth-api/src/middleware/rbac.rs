// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RBAC (Role-Based Access Control) middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AccessRule, AuthContext, Permission, Role};
use crate::error::ApiError;

// =============================================================================
// RbacLayer
// =============================================================================

/// Layer for role-based access control.
///
/// Runs after [`AuthLayer`](super::AuthLayer) and fails closed: a request
/// without an [`AuthContext`] is rejected with 401, one whose identity does
/// not satisfy the rule with 403.
#[derive(Clone)]
pub struct RbacLayer {
    rule: Arc<AccessRule>,
}

impl RbacLayer {
    /// Creates a layer enforcing an arbitrary rule.
    pub fn new(rule: AccessRule) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }

    /// Creates a layer requiring a role.
    pub fn require_role(role: Role) -> Self {
        Self::new(AccessRule::Role(role))
    }

    /// Creates a layer requiring a single permission.
    pub fn require(permission: Permission) -> Self {
        Self::new(AccessRule::Permission(permission))
    }

    /// Creates a layer requiring all specified permissions.
    pub fn require_all(permissions: Vec<Permission>) -> Self {
        Self::new(AccessRule::AllPermissions(permissions))
    }

    /// Creates a layer requiring any of the specified permissions.
    pub fn require_any(permissions: Vec<Permission>) -> Self {
        Self::new(AccessRule::AnyPermission(permissions))
    }

    /// Returns the enforced rule.
    pub fn rule(&self) -> &AccessRule {
        &self.rule
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            rule: self.rule.clone(),
        }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for RBAC enforcement.
#[derive(Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    rule: Arc<AccessRule>,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let rule = self.rule.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<AuthContext>() else {
                tracing::warn!("No auth context found, denying access");
                return Ok(ApiError::unauthorized("Authentication required").into_response());
            };

            if rule.is_satisfied_by(ctx) {
                return inner.call(req).await;
            }

            tracing::warn!(
                user_id = %ctx.user_id,
                required = %rule,
                user_roles = ?ctx.roles,
                "Permission denied"
            );
            Ok(ApiError::forbidden("Insufficient permissions").into_response())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use gauth_core::PermissionSet;
    use std::convert::Infallible;
    use tower::util::BoxCloneService;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn ok_service() -> BoxCloneService<Request<Body>, Response, Infallible> {
        BoxCloneService::new(tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }))
    }

    fn request_as(roles: Vec<Role>) -> Request<Body> {
        let mut permissions = PermissionSet::new();
        for role in &roles {
            permissions.merge(&role.default_permissions());
        }
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            username: "carol".to_string(),
            session_token: "session".to_string(),
            roles,
            permissions: Arc::new(permissions),
            client_ip: None,
            request_id: Uuid::now_v7(),
        };
        let mut req = Request::builder().uri("/api/users").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ctx);
        req
    }

    #[tokio::test]
    async fn test_require_role() {
        let service = RbacLayer::require_role(Role::Admin).layer(ok_service());

        let response = service.clone().oneshot(request_as(vec![Role::Admin])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = service.oneshot(request_as(vec![Role::User])).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_context_is_unauthorized() {
        let service = RbacLayer::require(Permission::UserRead).layer(ok_service());
        let req = Request::builder().uri("/api/users").body(Body::empty()).unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_permission_rules() {
        let service = RbacLayer::require_all(vec![Permission::ProfileRead, Permission::ProfileUpdate])
            .layer(ok_service());
        let response = service.oneshot(request_as(vec![Role::User])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let service = RbacLayer::require_any(vec![Permission::UserDelete, Permission::AuditRead])
            .layer(ok_service());
        let response = service.oneshot(request_as(vec![Role::User])).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
