// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for GAUTH.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Expand `${VAR}` / `${VAR:default}` placeholders
//! 3. Parse YAML, TOML or JSON into [`GauthConfig`]
//! 4. Apply `GAUTH_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! GAUTH_PORT=9090
//! GAUTH_JWT_SECRET=...
//! GAUTH_DATABASE_URL=postgres://...
//! GAUTH_DATABASE_BACKEND=memory
//! GAUTH_LOG_LEVEL=debug
//! ```
//!
//! # Environment-only Configuration
//!
//! [`load_from_env`] builds a configuration without a file from `PORT`,
//! `DATABASE_URL`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`,
//! `DB_SSLMODE`, `JWT_SECRET`, `JWT_ACCESS_EXPIRY`, `JWT_REFRESH_EXPIRY` and
//! `ENVIRONMENT`, then applies the `GAUTH_*` overrides on top.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Environment, GauthConfig, LogFormat, LogLevel, StoreBackend};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Variable lookup used for placeholders and overrides.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use gauth_config::ConfigLoader;
///
/// let config = ConfigLoader::new().load("gauth.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to expand placeholders and apply overrides.
    resolve_env_vars: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with the `GAUTH` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "GAUTH".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format is determined by the extension: `.yaml`/`.yml`, `.toml` or
    /// `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<GauthConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let format = ConfigFormat::from_path(path)?;

        self.load_with(&content, format, &process_env)
            .map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<GauthConfig> {
        self.load_with(content, format, &process_env)
    }

    /// Loads configuration from a string, resolving variables through `lookup`.
    pub fn load_with(
        &self,
        content: &str,
        format: ConfigFormat,
        lookup: Lookup<'_>,
    ) -> ConfigResult<GauthConfig> {
        let content = if self.resolve_env_vars {
            resolve_placeholders(content, lookup)
        } else {
            content.to_string()
        };

        let mut config: GauthConfig = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config, lookup)?;
        }

        config.validate()?;
        debug!(
            port = config.server.port,
            environment = %config.server.environment,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Applies `<PREFIX>_*` overrides.
    pub fn apply_env_overrides(&self, config: &mut GauthConfig, lookup: Lookup<'_>) -> ConfigResult<()> {
        let key = |suffix: &str| format!("{}_{}", self.env_prefix, suffix);

        if let Some(value) = lookup(&key("HOST")) {
            config.server.host = value.parse::<IpAddr>().map_err(|_| {
                ConfigError::invalid_env_var(key("HOST"), "expected IP address")
            })?;
        }
        if let Some(value) = lookup(&key("PORT")) {
            config.server.port = parse_port(&key("PORT"), &value)?;
        }
        if let Some(value) = lookup(&key("ENVIRONMENT")) {
            config.server.environment = Environment::parse(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(key("ENVIRONMENT"), "expected development, production or test")
            })?;
        }
        if let Some(value) = lookup(&key("DATABASE_URL")) {
            config.database.url = Some(value);
        }
        if let Some(value) = lookup(&key("DATABASE_BACKEND")) {
            config.database.backend = parse_backend(&key("DATABASE_BACKEND"), &value)?;
        }
        if let Some(value) = lookup(&key("JWT_SECRET")) {
            config.jwt.secret = value;
        }
        if let Some(value) = lookup(&key("RATE_LIMIT_ENABLED")) {
            config.rate_limit.enabled = parse_bool(&value);
        }
        if let Some(value) = lookup(&key("AUDIT_ENABLED")) {
            config.audit.enabled = parse_bool(&value);
        }
        if let Some(value) = lookup(&key("LOG_LEVEL")) {
            match LogLevel::parse(&value) {
                Some(level) => config.logging.level = level,
                None => warn!("Ignoring unknown log level '{}'", value),
            }
        }
        if let Some(value) = lookup(&key("LOG_FORMAT")) {
            config.logging.format = match value.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Text,
            };
        }
        if let Some(value) = lookup(&key("SEED_ADMIN_PASSWORD")) {
            config.seed.admin_password = value;
        }
        Ok(())
    }
}

// =============================================================================
// Environment-only Configuration
// =============================================================================

/// Builds a configuration from process environment variables alone.
pub fn load_from_env() -> ConfigResult<GauthConfig> {
    config_from_vars(&process_env)
}

impl GauthConfig {
    /// Builds a configuration from process environment variables alone.
    ///
    /// Equivalent to [`load_from_env`].
    pub fn from_env() -> ConfigResult<Self> {
        load_from_env()
    }
}

/// Builds a configuration from conventional variable names resolved through
/// `lookup`, then applies `GAUTH_*` overrides and validates.
pub fn config_from_vars(lookup: Lookup<'_>) -> ConfigResult<GauthConfig> {
    let mut config = GauthConfig::default();

    if let Some(value) = lookup("PORT") {
        config.server.port = parse_port("PORT", &value)?;
    }
    if let Some(value) = lookup("ENVIRONMENT") {
        config.server.environment = Environment::parse(&value)
            .ok_or_else(|| ConfigError::invalid_env_var("ENVIRONMENT", "unknown environment"))?;
    }
    if let Some(value) = lookup("STORE_BACKEND") {
        config.database.backend = parse_backend("STORE_BACKEND", &value)?;
    }
    config.database.url = lookup("DATABASE_URL");
    if let Some(value) = lookup("DB_HOST") {
        config.database.host = value;
    }
    if let Some(value) = lookup("DB_PORT") {
        config.database.port = parse_port("DB_PORT", &value)?;
    }
    if let Some(value) = lookup("DB_USER") {
        config.database.user = value;
    }
    if let Some(value) = lookup("DB_PASSWORD") {
        config.database.password = value;
    }
    if let Some(value) = lookup("DB_NAME") {
        config.database.name = value;
    }
    if let Some(value) = lookup("DB_SSLMODE") {
        config.database.sslmode = value;
    }
    if let Some(value) = lookup("JWT_SECRET") {
        config.jwt.secret = value;
    }
    if let Some(value) = lookup("JWT_ACCESS_EXPIRY") {
        config.jwt.access_expiration = parse_duration("JWT_ACCESS_EXPIRY", &value)?;
    }
    if let Some(value) = lookup("JWT_REFRESH_EXPIRY") {
        config.jwt.refresh_expiration = parse_duration("JWT_REFRESH_EXPIRY", &value)?;
    }

    ConfigLoader::new().apply_env_overrides(&mut config, lookup)?;
    config.validate()?;
    Ok(config)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Expands `${VAR}` and `${VAR:default}` placeholders.
///
/// Unknown variables without a default are left in place.
pub fn resolve_placeholders(content: &str, lookup: Lookup<'_>) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };

        match (lookup(name), default) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(default)) => result.push_str(default),
            (None, None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let source = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            source
                .try_deserialize()
                .map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Parses a string to bool.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

fn parse_port(name: &str, value: &str) -> ConfigResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env_var(name, "expected valid port number"))
}

fn parse_duration(name: &str, value: &str) -> ConfigResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))
}

fn parse_backend(name: &str, value: &str) -> ConfigResult<StoreBackend> {
    match value.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        "memory" => Ok(StoreBackend::Memory),
        _ => Err(ConfigError::invalid_env_var(name, "expected postgres or memory")),
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<GauthConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const YAML: &str = r#"
server:
  port: 9090
  environment: test
database:
  backend: memory
jwt:
  secret: "${TEST_SECRET:fallback-secret-that-is-long-enough-to-pass}"
  access_expiration: 15m
  refresh_expiration: 7d
rate_limit:
  max_requests: 5
  window: 10s
"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")).unwrap(), ConfigFormat::Json);
        assert!(ConfigFormat::from_path(Path::new("a.ini")).is_err());
    }

    #[test]
    fn test_resolve_placeholders() {
        let env = vars(&[("NAME", "gauth")]);
        let lookup = |k: &str| env.get(k).cloned();

        assert_eq!(resolve_placeholders("db=${NAME}", &lookup), "db=gauth");
        assert_eq!(resolve_placeholders("${MISSING:x}-${NAME}", &lookup), "x-gauth");
        assert_eq!(resolve_placeholders("${MISSING}", &lookup), "${MISSING}");
        assert_eq!(resolve_placeholders("tail ${OPEN", &lookup), "tail ${OPEN");
        assert_eq!(resolve_placeholders("${URL:postgres://h:5432}", &lookup), "postgres://h:5432");
    }

    #[test]
    fn test_load_yaml_with_default_placeholder() {
        let env: HashMap<String, String> = HashMap::new();
        let config = ConfigLoader::new()
            .load_with(YAML, ConfigFormat::Yaml, &|k: &str| env.get(k).cloned())
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.environment, Environment::Test);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.jwt.secret, "fallback-secret-that-is-long-enough-to-pass");
        assert_eq!(config.jwt.access_expiration, Duration::from_secs(900));
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides() {
        let env = vars(&[
            ("TEST_SECRET", "from-env-secret-that-is-long-enough-too"),
            ("GAUTH_PORT", "7000"),
            ("GAUTH_LOG_LEVEL", "debug"),
            ("GAUTH_DATABASE_URL", "postgres://x@y/z"),
        ]);
        let config = ConfigLoader::new()
            .load_with(YAML, ConfigFormat::Yaml, &|k: &str| env.get(k).cloned())
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.jwt.secret, "from-env-secret-that-is-long-enough-too");
        assert_eq!(config.database.connection_url(), "postgres://x@y/z");
    }

    #[test]
    fn test_invalid_port_override() {
        let env = vars(&[("GAUTH_PORT", "not-a-port")]);
        let err = ConfigLoader::new()
            .load_with(YAML, ConfigFormat::Yaml, &|k: &str| env.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_load_toml_and_json() {
        let toml = r#"
[jwt]
secret = "toml-secret-that-is-long-enough-for-tests"

[server]
port = 8181
"#;
        let config = ConfigLoader::new()
            .with_env_vars(false)
            .load_from_str(toml, ConfigFormat::Toml)
            .unwrap();
        assert_eq!(config.server.port, 8181);

        let json = r#"{"jwt": {"secret": "json-secret-that-is-long-enough-for-tests"}}"#;
        let config = ConfigLoader::new()
            .with_env_vars(false)
            .load_from_str(json, ConfigFormat::Json)
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"jwt": {"secret": "x"}, "bogus": 1}"#;
        assert!(ConfigLoader::new()
            .with_env_vars(false)
            .load_from_str(json, ConfigFormat::Json)
            .is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = ConfigLoader::new().load(file.path()).unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_config_from_vars() {
        let env = vars(&[
            ("PORT", "3001"),
            ("DB_HOST", "db.internal"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "auth"),
            ("JWT_SECRET", "env-secret-that-is-long-enough-for-tests"),
            ("JWT_ACCESS_EXPIRY", "1h"),
            ("ENVIRONMENT", "release"),
        ]);
        let config = config_from_vars(&|k: &str| env.get(k).cloned()).unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.environment, Environment::Production);
        assert_eq!(config.jwt.access_expiration, Duration::from_secs(3600));
        assert_eq!(
            config.database.connection_url(),
            "postgres://postgres:pw@db.internal:5432/auth?sslmode=disable"
        );
    }

    #[test]
    fn test_config_from_vars_requires_secret() {
        let env: HashMap<String, String> = HashMap::new();
        assert!(config_from_vars(&|k: &str| env.get(k).cloned()).is_err());
    }
}
