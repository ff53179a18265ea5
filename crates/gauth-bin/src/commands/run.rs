// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use gauth_config::GauthConfig;

use crate::cli::RunArgs;
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Serves the API until SIGINT or SIGTERM.
pub async fn run(args: RunArgs, config: GauthConfig) -> BinResult<()> {
    RuntimeBuilder::new()
        .config(config)
        .port(args.port)
        .skip_migrations(args.skip_migrations)
        .skip_seed(args.skip_seed)
        .build()?
        .run()
        .await
}
