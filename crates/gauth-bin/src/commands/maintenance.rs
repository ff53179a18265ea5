// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `migrate` and `seed` commands.

use gauth_config::{GauthConfig, StoreBackend};
use tracing::{info, warn};

use crate::error::BinResult;
use crate::runtime::{self, connect_store};

/// Applies pending migrations and exits.
pub async fn migrate(config: &GauthConfig) -> BinResult<()> {
    if config.database.backend == StoreBackend::Memory {
        info!("The in-memory store has no schema; nothing to migrate");
        return Ok(());
    }

    let handles = connect_store(config).await?;
    let result = handles.migrate().await;
    handles.close().await;
    result?;

    println!("Migrations applied");
    Ok(())
}

/// Seeds default roles and the administrator account and exits.
///
/// Runs even when `seed.enabled` is false.
pub async fn seed(config: &GauthConfig) -> BinResult<()> {
    if config.database.backend == StoreBackend::Memory {
        warn!("Seeding the in-memory store; the data is discarded when this command exits");
    }

    let handles = connect_store(config).await?;
    let mut result = Ok(());
    if config.database.run_migrations {
        result = handles.migrate().await;
    }
    if result.is_ok() {
        result = runtime::seed(&handles, config).await;
    }
    handles.close().await;
    result?;

    println!("Seeding complete");
    Ok(())
}
