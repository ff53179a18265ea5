// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ClientIp, UserAgent, ValidatedJson};
use crate::response::MessageResponse;
use crate::session::{ClientInfo, TokenGrant};
use crate::state::AppState;
use gauth_core::UserWithRoles;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login
///
/// Authenticates a user by username or email and opens a session.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenGrant>> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let client = ClientInfo::new(
        client_ip.map(|ip| ip.to_string()).unwrap_or_default(),
        user_agent,
    );
    let grant = state
        .sessions()
        .login(request.username.trim(), &request.password, client)
        .await?;

    Ok(Json(grant))
}

// =============================================================================
// Refresh Token
// =============================================================================

/// Refresh token request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: String,
}

/// POST /api/auth/refresh
///
/// Mints a new access token for the session behind a refresh token. The
/// refresh token is returned unchanged.
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<TokenGrant>> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token is required"));
    }

    let grant = state.sessions().refresh(&request.refresh_token).await?;
    Ok(Json(grant))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /api/auth/logout
///
/// Ends the caller's session. Every token bound to it stops working.
pub async fn logout(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<MessageResponse> {
    state
        .sessions()
        .logout(auth_ctx.user_id, &auth_ctx.session_token)
        .await?;

    Ok(MessageResponse::new("Logged out successfully"))
}

// =============================================================================
// Current User
// =============================================================================

/// GET /api/auth/me
///
/// Returns the authenticated user with roles.
pub async fn me(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<Json<UserWithRoles>> {
    let user = state
        .store()
        .get_user_with_roles(auth_ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

// =============================================================================
// Change Password
// =============================================================================

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Password currently on file.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    state
        .sessions()
        .change_password(
            auth_ctx.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(MessageResponse::new("Password changed successfully"))
}
