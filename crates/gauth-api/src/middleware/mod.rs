// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! This module provides a layered middleware stack for security and observability:
//!
//! - [`AuthMiddleware`]: Bearer token and session authentication
//! - [`RbacLayer`]: Role and permission checks
//! - [`RateLimitLayer`]: Sliding-window rate limiting per client IP
//! - [`AuditMiddleware`]: Per-request audit records
//! - [`recovery_layer`]: Panic to 500 conversion
//! - [`timeout_response`]: JSON body for elapsed requests

mod audit;
mod auth;
mod rate_limit;
mod rbac;
mod recovery;
mod timeout;

pub use audit::{AuditLayer, AuditMiddleware};
pub use auth::{AuthLayer, AuthMiddleware};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimitLayer, SlidingWindowLimiter};
pub use rbac::{RbacLayer, RbacMiddleware};
pub use recovery::{handle_panic, recovery_layer};
pub use timeout::timeout_response;
