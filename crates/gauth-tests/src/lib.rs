// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # GAUTH Integration Tests
//!
//! Shared fixtures, an in-process test harness and assertion helpers for the
//! GAUTH integration suites.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Configurations, credentials and forged tokens
//!   - `harness`: [`TestApp`](common::harness::TestApp), the full router over
//!     an in-memory store driven with `tower::ServiceExt::oneshot`
//!   - `assertions`: Response and audit assertions
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gauth-tests
//! cargo test -p gauth-tests --test integration_auth
//! cargo test -p gauth-tests --test integration_users
//! cargo test -p gauth-tests --test integration_middleware
//! cargo test -p gauth-tests --test integration_config
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use gauth_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new().await;
//!     let tokens = app.login_admin().await;
//!     let response = app.get("/api/users", Some(&tokens.access_token)).await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use axum::http::StatusCode;
}
