// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gauth-config
//!
//! Configuration management for the GAUTH authentication service.
//!
//! ## Features
//!
//! - **Schema Definition**: Typed configuration with defaults and validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Placeholders**: `${VAR}` and `${VAR:default}` are expanded from the
//!   environment before parsing
//! - **Environment Overrides**: `GAUTH_*` variables override file values
//! - **Environment-only Mode**: Build a full configuration from the
//!   conventional `PORT`, `DB_*` and `JWT_*` variables
//!
//! ## Quick Start
//!
//! ```no_run
//! use gauth_config::load_config;
//!
//! let config = load_config("gauth.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - Bind address, environment and timeouts
//! - `database` - Store backend and PostgreSQL connection
//! - `jwt` - Signing secret and token lifetimes
//! - `password` - bcrypt work factor
//! - `rate_limit` - Sliding-window limits per client
//! - `cors` - Allowed origins
//! - `audit` - Request audit trail
//! - `logging` - Log level and format
//! - `seed` - Default administrator account

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_from_env, ConfigFormat, ConfigLoader};
pub use schema::{
    AuditConfig, CorsConfig, DatabaseConfig, Environment, GauthConfig, JwtConfig, LogFormat,
    LogLevel, LoggingConfig, PasswordConfig, RateLimitConfig, SeedConfig, ServerConfig,
    StoreBackend,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
