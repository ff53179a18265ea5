// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: Start the API server
//! - `validate`: Validate the configuration
//! - `migrate`: Apply database migrations
//! - `seed`: Create default roles and the administrator
//! - `hash-password`: Print a bcrypt hash
//! - `version`: Show version information

mod hash_password;
mod maintenance;
mod run;
mod validate;
mod version;

pub use hash_password::{hash_password, read_password};
pub use maintenance::{migrate, seed};
pub use run::run;
pub use validate::{collect_warnings, validate};
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};
use crate::runtime::LoadedConfig;

/// Executes the command selected on the command line.
///
/// `loaded` must be present for every command that reads the configuration.
pub async fn execute(cli: &Cli, loaded: Option<LoadedConfig>) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run(args, require(loaded)?.config).await,
        Commands::Validate(args) => validate(args, &require(loaded)?),
        Commands::Migrate => migrate(&require(loaded)?.config).await,
        Commands::Seed => seed(&require(loaded)?.config).await,
        Commands::HashPassword(args) => hash_password(args),
        Commands::Version => version(cli),
    }
}

fn require(loaded: Option<LoadedConfig>) -> BinResult<LoadedConfig> {
    loaded.ok_or_else(|| BinError::config("Configuration was not loaded"))
}
