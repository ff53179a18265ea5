// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gauth-api
//!
//! REST API server for the GAUTH authentication service.
//!
//! This crate provides the HTTP API with session-backed JWT authentication,
//! role and permission gates, per-request audit logging, sliding-window rate
//! limiting and panic recovery.
//!
//! ## Routes
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | `GET` | `/health` | public |
//! | `POST` | `/api/auth/login` | public |
//! | `POST` | `/api/auth/refresh` | public |
//! | `POST` | `/api/auth/logout` | bearer |
//! | `GET` | `/api/auth/me` | bearer |
//! | `POST` | `/api/auth/change-password` | bearer |
//! | `GET`, `POST` | `/api/users` | bearer + `admin` |
//! | `GET`, `PUT`, `DELETE` | `/api/users/{id}` | bearer + `admin` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod session;
pub mod state;

pub use auth::{AccessRule, AuthContext, Claims, JwtConfig, JwtManager, TokenType};
pub use config::{ApiConfig, AuditConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use middleware::RateLimitConfig;
pub use server::{ApiServer, ApiServerBuilder};
pub use session::{ClientInfo, SessionIssuer, TokenGrant};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
