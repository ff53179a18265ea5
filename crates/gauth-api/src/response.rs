// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gauth_core::UserWithRoles;
use serde::{Deserialize, Serialize};

// =============================================================================
// Created
// =============================================================================

/// Wraps a body in a `201 Created` response.
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

// =============================================================================
// MessageResponse
// =============================================================================

/// `{"message": "..."}` confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Confirmation text.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// =============================================================================
// HealthResponse
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "gauth".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Requested page (1-indexed).
    pub current_page: u64,
    /// `ceil(total_items / items_per_page)`.
    pub total_pages: u64,
    /// Matching items across all pages.
    pub total_items: u64,
    /// Page size.
    pub items_per_page: u64,
}

impl PaginationMeta {
    /// Creates pagination metadata.
    pub fn new(current_page: u64, items_per_page: u64, total_items: u64) -> Self {
        let total_pages = if items_per_page == 0 {
            0
        } else {
            total_items.div_ceil(items_per_page)
        };
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
        }
    }
}

/// Paginated user list.
#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    /// Users on this page, with roles.
    pub users: Vec<UserWithRoles>,
    /// Page information.
    pub pagination: PaginationMeta,
}
