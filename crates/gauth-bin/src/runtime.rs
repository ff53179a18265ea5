// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Startup order:
//!
//! 1. Connect the credential store (in-memory or PostgreSQL)
//! 2. Apply migrations when enabled
//! 3. Seed default roles and the administrator when enabled
//! 4. Serve the API until shutdown, then drain within `shutdown_timeout`
//! 5. Close the database pool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gauth_api::{ApiConfig, ApiServerBuilder, AuditConfig, CorsConfig, JwtConfig, RateLimitConfig};
use gauth_config::{load_config, load_from_env, GauthConfig, SeedConfig, StoreBackend};
use gauth_core::seed::{seed_defaults, SeedOptions};
use gauth_core::store::PgStoreOptions;
use gauth_core::{
    AuditLogger, CredentialStore, InMemoryAuditLogger, MemoryStore, PasswordHasher, PostgresStore,
};
use tracing::{info, warn};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Configuration Loading
// =============================================================================

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from a file, with `GAUTH_*` overrides applied.
    File(PathBuf),
    /// Built from environment variables alone.
    Environment,
}

/// A loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The configuration.
    pub config: GauthConfig,
    /// Where it came from.
    pub source: ConfigSource,
}

/// Loads `path` if it exists, otherwise builds the configuration from the
/// environment.
pub fn load_gauth_config(path: &Path) -> BinResult<LoadedConfig> {
    if path.exists() {
        let config = load_config(path)?;
        return Ok(LoadedConfig {
            config,
            source: ConfigSource::File(path.to_path_buf()),
        });
    }

    let config = load_from_env()?;
    Ok(LoadedConfig {
        config,
        source: ConfigSource::Environment,
    })
}

/// Maps the service configuration onto the API server configuration.
pub fn api_config(config: &GauthConfig) -> ApiConfig {
    let jwt = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_expiration: config.jwt.access_expiration,
        refresh_expiration: config.jwt.refresh_expiration,
        leeway_secs: config.jwt.leeway_secs,
    };
    let rate_limit = RateLimitConfig {
        enabled: config.rate_limit.enabled,
        max_requests: config.rate_limit.max_requests,
        window: config.rate_limit.window,
        max_tracked_clients: config.rate_limit.max_tracked_clients,
        cleanup_interval: config.rate_limit.cleanup_interval,
    };

    ApiConfig {
        host: config.server.host,
        port: config.server.port,
        cors: CorsConfig {
            allowed_origins: config.cors.allowed_origins.clone(),
            allow_credentials: config.cors.allow_credentials,
            max_age: config.cors.max_age,
        },
        jwt,
        rate_limit,
        audit: AuditConfig {
            enabled: config.audit.enabled,
            exclude_paths: config.audit.exclude_paths.clone(),
        },
        bcrypt_cost: config.password.bcrypt_cost,
        request_timeout: config.server.request_timeout,
        shutdown_timeout: config.server.shutdown_timeout,
        max_body_size: config.server.max_body_size,
    }
}

/// Maps the seed section onto the seeding options.
pub fn seed_options(seed: &SeedConfig) -> SeedOptions {
    SeedOptions {
        admin_username: seed.admin_username.clone(),
        admin_email: seed.admin_email.clone(),
        admin_password: seed.admin_password.clone(),
    }
}

// =============================================================================
// Store Connection
// =============================================================================

/// The connected persistence backends.
pub struct StoreHandles {
    /// Credential store shared by the API.
    pub store: Arc<dyn CredentialStore>,
    /// Audit sink.
    pub audit_logger: Arc<dyn AuditLogger>,
    postgres: Option<Arc<PostgresStore>>,
}

impl StoreHandles {
    /// Creates process-local handles.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            audit_logger: Arc::new(InMemoryAuditLogger::new()),
            postgres: None,
        }
    }

    /// Creates handles backed by one PostgreSQL pool.
    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let audit_logger: Arc<dyn AuditLogger> = store.clone();
        Self {
            store: credentials,
            audit_logger,
            postgres: Some(store),
        }
    }

    /// Returns `true` if backed by PostgreSQL.
    pub fn is_postgres(&self) -> bool {
        self.postgres.is_some()
    }

    /// Applies migrations. A no-op for the in-memory store.
    pub async fn migrate(&self) -> BinResult<()> {
        if let Some(ref pg) = self.postgres {
            pg.migrate()
                .await
                .map_err(|e| BinError::from(e).with_context("Applying migrations"))?;
        }
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        if let Some(ref pg) = self.postgres {
            pg.close().await;
            info!("Database pool closed");
        }
    }
}

/// Connects the configured backend.
pub async fn connect_store(config: &GauthConfig) -> BinResult<StoreHandles> {
    match config.database.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(StoreHandles::memory())
        }
        StoreBackend::Postgres => {
            let options = PgStoreOptions {
                max_connections: config.database.max_connections,
                min_connections: config.database.min_connections,
                acquire_timeout: config.database.acquire_timeout,
                idle_timeout: config.database.idle_timeout,
            };
            let store = PostgresStore::connect(&config.database.connection_url(), &options)
                .await
                .map_err(|e| BinError::from(e).with_context("Connecting to PostgreSQL"))?;
            Ok(StoreHandles::postgres(store))
        }
    }
}

/// Seeds default roles and the administrator account.
pub async fn seed(handles: &StoreHandles, config: &GauthConfig) -> BinResult<()> {
    let hasher = PasswordHasher::new(config.password.bcrypt_cost);
    let report = seed_defaults(handles.store.as_ref(), &hasher, &seed_options(&config.seed))
        .await
        .map_err(|e| BinError::from(e).with_context("Seeding defaults"))?;

    if report.is_noop() {
        info!("Default roles and administrator already present");
    } else {
        info!(
            roles = ?report.roles_created,
            admin_created = report.admin_created,
            "Seeded defaults"
        );
    }
    Ok(())
}

// =============================================================================
// GauthRuntime
// =============================================================================

/// Runs the API server with its store until shutdown.
pub struct GauthRuntime {
    config: Arc<GauthConfig>,
    shutdown: ShutdownCoordinator,
    migrate: bool,
    seed: bool,
}

impl GauthRuntime {
    /// Creates a runtime that migrates and seeds as configured.
    pub fn new(config: GauthConfig) -> Self {
        Self {
            migrate: config.database.run_migrations,
            seed: config.seed.enabled,
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> BinResult<()> {
        info!(
            version = gauth_core::VERSION,
            environment = %self.config.server.environment,
            "Starting GAUTH"
        );

        let handles = connect_store(&self.config).await?;
        let result = self.serve(&handles).await;
        handles.close().await;

        info!("GAUTH shutdown complete");
        result
    }

    async fn serve(&self, handles: &StoreHandles) -> BinResult<()> {
        if self.migrate {
            handles.migrate().await?;
        }
        if self.seed {
            seed(handles, &self.config).await?;
        }

        let server = ApiServerBuilder::new()
            .config(api_config(&self.config))
            .store(handles.store.clone())
            .audit_logger(handles.audit_logger.clone())
            .build()?;

        let mut server_task = tokio::spawn(server.run_with_shutdown(self.shutdown.shutdown_signal()));

        tokio::select! {
            joined = &mut server_task => return flatten(joined),
            _ = self.shutdown.wait_for_shutdown() => {}
        }

        let grace = self.config.server.shutdown_timeout;
        info!(grace = ?grace, "Draining in-flight requests");
        match tokio::time::timeout(grace, &mut server_task).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!("Shutdown timeout elapsed with requests still in flight");
                server_task.abort();
                Ok(())
            }
        }
    }
}

fn flatten(
    joined: Result<gauth_api::ApiResult<()>, tokio::task::JoinError>,
) -> BinResult<()> {
    match joined {
        Ok(result) => result.map_err(BinError::from),
        Err(e) => Err(BinError::runtime(format!("Server task failed: {}", e))),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`GauthRuntime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    config: Option<GauthConfig>,
    port: Option<u16>,
    skip_migrations: bool,
    skip_seed: bool,
}

impl RuntimeBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: GauthConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Skips migrations even if the configuration enables them.
    pub fn skip_migrations(mut self, skip: bool) -> Self {
        self.skip_migrations = skip;
        self
    }

    /// Skips seeding even if the configuration enables it.
    pub fn skip_seed(mut self, skip: bool) -> Self {
        self.skip_seed = skip;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<GauthRuntime> {
        let mut config = self
            .config
            .ok_or_else(|| BinError::config("Configuration is required"))?;

        if let Some(port) = self.port {
            if port == 0 {
                return Err(BinError::config("Port cannot be zero"));
            }
            config.server.port = port;
        }

        let mut runtime = GauthRuntime::new(config);
        runtime.migrate &= !self.skip_migrations;
        runtime.seed &= !self.skip_seed;
        Ok(runtime)
    }
}

// =============================================================================
// Tests
// =============================================================================
