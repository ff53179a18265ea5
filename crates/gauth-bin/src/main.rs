// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! GAUTH - authentication and authorization service
//!
//! Main binary entry point.

use gauth_bin::cli::{Cli, LogFormat};
use gauth_bin::error::{report_error_and_exit, BinResult};
use gauth_bin::runtime::{load_gauth_config, ConfigSource};
use gauth_bin::{commands, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = try_main(cli).await {
        report_error_and_exit(e);
    }
}

async fn try_main(cli: Cli) -> BinResult<()> {
    let loaded = if cli.needs_config() {
        Some(load_gauth_config(&cli.config))
    } else {
        None
    };

    let (level, format) = match loaded {
        Some(Ok(ref l)) => (
            Some(l.config.logging.level.as_str()),
            Some(LogFormat::from(l.config.logging.format)),
        ),
        _ => (None, None),
    };
    init_logging(cli.effective_log_level(level), cli.effective_log_format(format))?;

    let loaded = loaded.transpose()?;
    if let Some(ref l) = loaded {
        match l.source {
            ConfigSource::File(ref path) => {
                tracing::debug!(path = %path.display(), "Loaded configuration file")
            }
            ConfigSource::Environment => tracing::info!(
                path = %cli.config.display(),
                "Configuration file not found; using environment variables"
            ),
        }
    }

    commands::execute(&cli, loaded).await
}
