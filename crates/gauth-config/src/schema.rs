// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for GAUTH.
//!
//! # Schema Structure
//!
//! ```text
//! GauthConfig
//! ├── server: ServerConfig
//! ├── database: DatabaseConfig
//! ├── jwt: JwtConfig
//! ├── password: PasswordConfig
//! ├── rate_limit: RateLimitConfig
//! ├── cors: CorsConfig
//! ├── audit: AuditConfig
//! ├── logging: LoggingConfig
//! └── seed: SeedConfig
//! ```
//!
//! Every section has defaults, so an empty document is a valid development
//! configuration once `jwt.secret` is provided.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default access token lifetime (24 hours).
pub const DEFAULT_ACCESS_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default refresh token and session lifetime (7 days).
pub const DEFAULT_REFRESH_EXPIRATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default requests allowed per client per window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;

/// Minimum recommended JWT secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for GAUTH.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GauthConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// JWT configuration.
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Password hashing configuration.
    #[serde(default)]
    pub password: PasswordConfig,

    /// Rate limiting configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Audit trail configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Seed data configuration.
    #[serde(default)]
    pub seed: SeedConfig,
}

impl GauthConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.password.validate()?;
        self.rate_limit.validate()?;
        self.seed.validate()?;

        if self.server.environment == Environment::Production {
            if self.seed.enabled && self.seed.admin_password == default_admin_password() {
                tracing::warn!("Seeding the default administrator password in production");
            }
            if self.database.backend == StoreBackend::Memory {
                tracing::warn!("Using the in-memory store in production; data is not persisted");
            }
        }
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Production deployment.
    Production,
    /// Automated tests.
    Test,
}

impl Environment {
    /// Parses an environment name. Accepts `debug` and `release` aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" | "debug" => Some(Environment::Development),
            "production" | "prod" | "release" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }

    /// Returns the environment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Whole-request timeout.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Grace period for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation("server.request_timeout", "cannot be zero"));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation("server.max_body_size", "cannot be zero"));
        }
        Ok(())
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            environment: Environment::default(),
            request_timeout: default_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Credential store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL through a connection pool.
    #[default]
    Postgres,
    /// Process-local maps. Data is lost on restart.
    Memory,
}

/// Credential store configuration.
///
/// Either `url` is set, or the URL is assembled from the individual parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Store backend.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Full connection URL. Takes precedence over the individual parts.
    #[serde(default)]
    pub url: Option<String>,

    /// Database host.
    #[serde(default = "default_db_host")]
    pub host: String,

    /// Database port.
    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database user.
    #[serde(default = "default_db_user")]
    pub user: String,

    /// Database password.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub name: String,

    /// PostgreSQL `sslmode`.
    #[serde(default = "default_sslmode")]
    pub sslmode: String,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// Idle connection lifetime.
    #[serde(default = "default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// Apply schema migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "gauth".to_string()
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_true() -> bool {
    true
}

impl DatabaseConfig {
    /// Validates the database configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }
        if self.max_connections == 0 {
            return Err(ConfigError::validation("database.max_connections", "cannot be zero"));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                "cannot exceed max_connections",
            ));
        }
        if self.url.is_none() && self.host.is_empty() {
            return Err(ConfigError::validation(
                "database.host",
                "either url or host must be set",
            ));
        }
        Ok(())
    }

    /// Returns the PostgreSQL connection URL.
    pub fn connection_url(&self) -> String {
        if let Some(ref url) = self.url {
            return url.clone();
        }
        let credentials = if self.password.is_empty() {
            self.user.clone()
        } else {
            format!("{}:{}", self.user, self.password)
        };
        format!(
            "postgres://{}@{}:{}/{}?sslmode={}",
            credentials, self.host, self.port, self.name, self.sslmode
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            sslmode: default_sslmode(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout: default_acquire_timeout(),
            idle_timeout: default_idle_timeout(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// JWT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC signing secret.
    #[serde(default, skip_serializing)]
    pub secret: String,

    /// Access token lifetime.
    #[serde(default = "default_access_expiration", with = "humantime_serde")]
    pub access_expiration: Duration,

    /// Refresh token and session lifetime.
    #[serde(default = "default_refresh_expiration", with = "humantime_serde")]
    pub refresh_expiration: Duration,

    /// Clock skew tolerance in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_access_expiration() -> Duration {
    DEFAULT_ACCESS_EXPIRATION
}

fn default_refresh_expiration() -> Duration {
    DEFAULT_REFRESH_EXPIRATION
}

impl JwtConfig {
    /// Validates the JWT configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.secret.is_empty() {
            return Err(ConfigError::validation("jwt.secret", "cannot be empty"));
        }
        if self.secret.len() < MIN_SECRET_LEN {
            tracing::warn!(
                "JWT secret is shorter than {} bytes; use a longer secret in production",
                MIN_SECRET_LEN
            );
        }
        if self.access_expiration.is_zero() {
            return Err(ConfigError::validation("jwt.access_expiration", "cannot be zero"));
        }
        if self.access_expiration >= self.refresh_expiration {
            return Err(ConfigError::validation(
                "jwt.access_expiration",
                "must be shorter than refresh_expiration",
            ));
        }
        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_expiration: DEFAULT_ACCESS_EXPIRATION,
            refresh_expiration: DEFAULT_REFRESH_EXPIRATION,
            leeway_secs: 0,
        }
    }
}

/// Password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordConfig {
    /// bcrypt work factor.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl PasswordConfig {
    /// Validates the password configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::validation(
                "password.bcrypt_cost",
                "must be between 4 and 31",
            ));
        }
        Ok(())
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per client within `window`.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Sliding window length.
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,

    /// Maximum number of clients tracked at once.
    #[serde(default = "default_max_tracked_clients")]
    pub max_tracked_clients: usize,

    /// How often idle clients are evicted.
    #[serde(default = "default_cleanup_interval", with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

fn default_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_max_tracked_clients() -> usize {
    10_000
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(60)
}

impl RateLimitConfig {
    /// Validates the rate limit configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_requests == 0 {
            return Err(ConfigError::validation("rate_limit.max_requests", "must be at least 1"));
        }
        if self.window.is_zero() {
            return Err(ConfigError::validation("rate_limit.window", "cannot be zero"));
        }
        if self.max_tracked_clients == 0 {
            return Err(ConfigError::validation(
                "rate_limit.max_tracked_clients",
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: default_window(),
            max_tracked_clients: default_max_tracked_clients(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,

    /// Allow cookies and authorization headers.
    #[serde(default = "default_true")]
    pub allow_credentials: bool,

    /// Preflight cache lifetime.
    #[serde(default = "default_max_age", with = "humantime_serde")]
    pub max_age: Duration,
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_max_age() -> Duration {
    Duration::from_secs(12 * 60 * 60)
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
            allow_credentials: true,
            max_age: default_max_age(),
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether requests are audited.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Paths that are never audited.
    #[serde(default = "default_exclude_paths")]
    pub exclude_paths: Vec<String>,
}

fn default_exclude_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_paths: default_exclude_paths(),
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Text,
    /// Single-line compact.
    Compact,
    /// JSON lines.
    Json,
}

// =============================================================================
// Seed Configuration
// =============================================================================

/// Default administrator account created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Seed roles and the administrator on startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Administrator login name.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Administrator email.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Administrator password.
    #[serde(default = "default_admin_password", skip_serializing)]
    pub admin_password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@gauth.local".to_string()
}

fn default_admin_password() -> String {
    "password".to_string()
}

impl SeedConfig {
    /// Validates the seed configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.admin_username.len() < 3 || self.admin_username.len() > 50 {
            return Err(ConfigError::validation(
                "seed.admin_username",
                "must be between 3 and 50 characters",
            ));
        }
        if !self.admin_email.contains('@') {
            return Err(ConfigError::validation("seed.admin_email", "must be an email address"));
        }
        if self.admin_password.len() < 6 {
            return Err(ConfigError::validation(
                "seed.admin_password",
                "must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: default_admin_username(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
