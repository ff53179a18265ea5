// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - JWT token minting and validation (HS256 only)
//! - The per-request authentication context
//! - Access rules evaluated by the authorization gate

mod claims;
mod context;
mod jwt;
mod rbac;

pub use claims::{Claims, TokenType};
pub use context::AuthContext;
pub use gauth_core::{Permission, PermissionSet, Role};
pub use jwt::{JwtConfig, JwtManager};
pub use rbac::AccessRule;
