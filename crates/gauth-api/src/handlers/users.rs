// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User management handlers. Every route here sits behind the `admin` role.

use axum::{extract::State, Json};
use gauth_core::{NewUser, UserChanges, UserQuery, UserWithRoles};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, Pagination, PathId, ValidatedJson};
use crate::response::{Created, MessageResponse, PaginationMeta, UserListResponse};
use crate::session::MIN_PASSWORD_LEN;
use crate::state::AppState;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
const IDENTITY_TAKEN: &str = "Username or email already exists";

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of `POST /api/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Login name, 3 to 50 characters.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: String,
    /// Defaults to `true`.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Defaults to `false`.
    #[serde(default)]
    pub is_verified: bool,
    /// Roles to assign.
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

fn default_true() -> bool {
    true
}

/// Body of `PUT /api/users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
    /// Activation flag.
    pub is_active: Option<bool>,
    /// Verification flag.
    pub is_verified: Option<bool>,
    /// Replaces the role set when present.
    pub role_ids: Option<Vec<Uuid>>,
}

// =============================================================================
// Validation
// =============================================================================

fn validate_username(username: &str) -> ApiResult<()> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ApiError::bad_request(format!(
            "Username must be between {} and {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> ApiResult<()> {
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl CreateUserRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl UpdateUserRequest {
    fn validate(&self) -> ApiResult<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    fn changes(&self) -> UserChanges {
        UserChanges {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar: self.avatar.clone(),
            is_active: self.is_active,
            is_verified: self.is_verified,
        }
    }
}

async fn load_user(state: &AppState, id: Uuid) -> ApiResult<UserWithRoles> {
    state
        .store()
        .get_user_with_roles(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/users?page&limit&search
pub async fn list_users(
    State(state): State<AppState>,
    Pagination(params): Pagination,
) -> ApiResult<Json<UserListResponse>> {
    let query = UserQuery {
        offset: params.offset(),
        limit: params.limit,
        search: params.search.clone(),
    };
    let page = state.store().list_users(&query).await?;

    let ids: Vec<Uuid> = page.users.iter().map(|u| u.id).collect();
    let mut roles = state.store().roles_for_users(&ids).await?;
    let users = page
        .users
        .into_iter()
        .map(|user| {
            let user_roles = roles.remove(&user.id).unwrap_or_default();
            UserWithRoles::new(user, user_roles)
        })
        .collect();

    Ok(Json(UserListResponse {
        users,
        pagination: PaginationMeta::new(params.page, params.limit, page.total),
    }))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<Json<UserWithRoles>> {
    Ok(Json(load_user(&state, id).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<Created<UserWithRoles>> {
    request.validate()?;

    let store = state.store();
    if store
        .identity_taken(Some(&request.username), Some(&request.email), None)
        .await?
    {
        return Err(ApiError::conflict(IDENTITY_TAKEN));
    }

    let password_hash = state.hasher.hash_async(request.password).await?;
    let mut new_user = NewUser::new(request.username, request.email, password_hash)
        .with_name(request.first_name, request.last_name)
        .verified(request.is_verified)
        .active(request.is_active);
    new_user.avatar = request.avatar;

    let user = store.create_user(new_user).await?;
    if !request.role_ids.is_empty() {
        store.set_user_roles(user.id, &request.role_ids).await?;
    }

    tracing::info!(
        user_id = %user.id,
        created_by = %auth_ctx.user_id,
        "User created"
    );

    Ok(Created(load_user(&state, user.id).await?))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    PathId(id): PathId,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserWithRoles>> {
    let store = state.store();
    if store.get_user(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    request.validate()?;

    if (request.username.is_some() || request.email.is_some())
        && store
            .identity_taken(request.username.as_deref(), request.email.as_deref(), Some(id))
            .await?
    {
        return Err(ApiError::conflict(IDENTITY_TAKEN));
    }

    store.update_user(id, request.changes()).await?;
    if let Some(role_ids) = &request.role_ids {
        store.set_user_roles(id, role_ids).await?;
    }

    tracing::info!(user_id = %id, updated_by = %auth_ctx.user_id, "User updated");

    Ok(Json(load_user(&state, id).await?))
}

/// DELETE /api/users/{id}
///
/// Soft-deletes the user.
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    PathId(id): PathId,
) -> ApiResult<MessageResponse> {
    let store = state.store();
    if store.get_user(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    store.delete_user(id).await?;
    tracing::info!(user_id = %id, deleted_by = %auth_ctx.user_id, "User deleted");

    Ok(MessageResponse::new("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        serde_json::from_value(serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request_defaults() {
        let request = create_request("erin", "erin@example.com", "secret1");
        assert!(request.is_active);
        assert!(!request.is_verified);
        assert!(request.role_ids.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request("ab", "ab@example.com", "secret1").validate().is_err());
        assert!(create_request(&"x".repeat(51), "x@example.com", "secret1")
            .validate()
            .is_err());
        assert!(create_request("erin", "not-an-email", "secret1").validate().is_err());
        assert!(create_request("erin", "erin@example.com", "short").validate().is_err());
    }

    #[test]
    fn test_update_request_validation() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let request = UpdateUserRequest {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateUserRequest {
            username: Some("frank".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
        let changes = request.changes();
        assert_eq!(changes.username.as_deref(), Some("frank"));
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.email.is_none());
    }
}
