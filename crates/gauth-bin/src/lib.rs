// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gauth-bin
//!
//! Command line binary for the GAUTH authentication service.
//!
//! - CLI argument parsing with clap
//! - Store connection, migrations and seeding
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! gauth
//!
//! # Start with a custom config
//! gauth -c /etc/gauth/config.yaml
//!
//! # Validate configuration, failing on warnings
//! gauth validate --strict
//!
//! # Prepare the database
//! gauth migrate
//! gauth seed
//!
//! # Hash a password for manual provisioning
//! echo 's3cret' | gauth hash-password --stdin
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{load_gauth_config, ConfigSource, GauthRuntime, LoadedConfig, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
