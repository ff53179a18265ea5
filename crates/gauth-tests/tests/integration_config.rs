// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! - `test_file_*`: Loading configuration files from disk
//! - `test_env_*`: Environment placeholders and overrides
//! - `test_validation_*`: Rejected configurations

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use gauth_config::loader::config_from_vars;
use gauth_config::{
    load_config, ConfigError, ConfigFormat, ConfigLoader, Environment, LogFormat, LogLevel,
    StoreBackend,
};
use gauth_tests::prelude::*;
use tempfile::{Builder, NamedTempFile};

fn write_config(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn load_yaml(content: &str, pairs: &[(&str, &str)]) -> Result<gauth_config::GauthConfig, ConfigError> {
    let lookup = lookup_from(pairs);
    ConfigLoader::new().load_with(content, ConfigFormat::Yaml, &lookup)
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_file_yaml_loads_every_section() {
    let file = write_config(&ConfigFixtures::service_yaml(), ".yaml");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.server.port, 9443);
    assert_eq!(config.server.environment, Environment::Test);
    assert_eq!(config.server.request_timeout, Duration::from_secs(5));
    assert_eq!(config.database.backend, StoreBackend::Memory);
    assert_eq!(config.jwt.secret, TEST_JWT_SECRET);
    assert_eq!(config.jwt.access_expiration, Duration::from_secs(15 * 60));
    assert_eq!(config.jwt.refresh_expiration, Duration::from_secs(2 * 3600));
    assert_eq!(config.password.bcrypt_cost, TEST_BCRYPT_COST);
    assert_eq!(config.rate_limit.max_requests, 20);
    assert_eq!(config.rate_limit.window, Duration::from_secs(30));
    assert_eq!(config.audit.exclude_paths, vec!["/health", "/metrics"]);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_file_defaults_fill_missing_sections() {
    let file = write_config(
        &format!("jwt:\n  secret: {}\n", TEST_JWT_SECRET),
        ".yml",
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.database.backend, StoreBackend::Postgres);
    assert_eq!(
        config.database.connection_url(),
        "postgres://postgres@localhost:5432/gauth?sslmode=disable"
    );
    assert_eq!(config.jwt.access_expiration, Duration::from_secs(24 * 3600));
    assert_eq!(config.jwt.refresh_expiration, Duration::from_secs(7 * 24 * 3600));
    assert!(config.rate_limit.enabled);
    assert!(config.audit.enabled);
    assert!(config.seed.enabled);
    assert_eq!(config.seed.admin_username, AdminFixtures::username());
}

#[test]
fn test_file_json_and_toml_formats() {
    let json = write_config(
        &format!(
            r#"{{"jwt": {{"secret": "{}"}}, "server": {{"port": 7001}}}}"#,
            TEST_JWT_SECRET
        ),
        ".json",
    );
    assert_eq!(load_config(json.path()).unwrap().server.port, 7001);

    let toml = write_config(
        &format!("[jwt]\nsecret = \"{}\"\n\n[server]\nport = 7002\n", TEST_JWT_SECRET),
        ".toml",
    );
    assert_eq!(load_config(toml.path()).unwrap().server.port, 7002);
}

#[test]
fn test_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.yaml")).unwrap_err();

    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn test_file_unsupported_extension() {
    let file = write_config("port = 1", ".ini");
    let err = load_config(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_file_parse_error_names_path() {
    let file = write_config("server: [unclosed", ".yaml");
    let err = load_config(file.path()).unwrap_err();

    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("Expected parse error, got {}", other),
    }
}

#[test]
fn test_file_unknown_field_rejected() {
    let err = load_yaml(
        &format!("jwt:\n  secret: {}\n  algorithm: HS512\n", TEST_JWT_SECRET),
        &[],
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Serialization { .. }));
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn test_env_placeholders_expand() {
    let config = load_yaml(
        "jwt:\n  secret: ${SIGNING_KEY}\nserver:\n  port: ${APP_PORT:8181}\n",
        &[("SIGNING_KEY", TEST_JWT_SECRET)],
    )
    .unwrap();

    assert_eq!(config.jwt.secret, TEST_JWT_SECRET);
    assert_eq!(config.server.port, 8181);
}

#[test]
fn test_env_overrides_file_values() {
    let config = load_yaml(
        &ConfigFixtures::service_yaml(),
        &[
            ("GAUTH_PORT", "7443"),
            ("GAUTH_ENVIRONMENT", "production"),
            ("GAUTH_JWT_SECRET", "an-overriding-secret-of-sufficient-size"),
            ("GAUTH_RATE_LIMIT_ENABLED", "false"),
            ("GAUTH_LOG_LEVEL", "warn"),
            ("GAUTH_LOG_FORMAT", "compact"),
        ],
    )
    .unwrap();

    assert_eq!(config.server.port, 7443);
    assert_eq!(config.server.environment, Environment::Production);
    assert_eq!(config.jwt.secret, "an-overriding-secret-of-sufficient-size");
    assert!(!config.rate_limit.enabled);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.format, LogFormat::Compact);
    // Untouched values survive.
    assert_eq!(config.jwt.access_expiration, Duration::from_secs(15 * 60));
}

#[test]
fn test_env_overrides_can_be_disabled() {
    let lookup = lookup_from(&[("GAUTH_PORT", "7443")]);
    let config = ConfigLoader::new()
        .with_env_vars(false)
        .load_with(&ConfigFixtures::service_yaml(), ConfigFormat::Yaml, &lookup)
        .unwrap();

    assert_eq!(config.server.port, 9443);
}

#[test]
fn test_env_invalid_override_rejected() {
    let err = load_yaml(&ConfigFixtures::service_yaml(), &[("GAUTH_PORT", "eighty")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "GAUTH_PORT"));

    let err = load_yaml(
        &ConfigFixtures::service_yaml(),
        &[("GAUTH_DATABASE_BACKEND", "mongodb")],
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
}

#[test]
fn test_env_only_configuration() {
    let lookup = lookup_from(&[
        ("PORT", "8088"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("JWT_ACCESS_EXPIRY", "30m"),
        ("JWT_REFRESH_EXPIRY", "12h"),
        ("DB_HOST", "db.internal"),
        ("DB_USER", "gauth"),
        ("DB_PASSWORD", "pw"),
        ("DB_SSLMODE", "require"),
    ]);

    let config = config_from_vars(&lookup).unwrap();

    assert_eq!(config.server.port, 8088);
    assert_eq!(config.jwt.access_expiration, Duration::from_secs(30 * 60));
    assert_eq!(config.jwt.refresh_expiration, Duration::from_secs(12 * 3600));
    assert_eq!(
        config.database.connection_url(),
        "postgres://gauth:pw@db.internal:5432/gauth?sslmode=require"
    );
}

#[test]
fn test_env_database_url_wins() {
    let lookup = lookup_from(&[
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("DATABASE_URL", "postgres://app@primary/auth"),
        ("DB_HOST", "ignored"),
    ]);

    let config = config_from_vars(&lookup).unwrap();

    assert_eq!(config.database.connection_url(), "postgres://app@primary/auth");
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validation_requires_secret() {
    let err = config_from_vars(&lookup_from(&[])).unwrap_err();

    assert!(err.is_validation());
    assert!(err.to_string().contains("jwt.secret"));
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = [
        ("server:\n  port: 0\n", "server.port"),
        ("jwt:\n  access_expiration: 2h\n  refresh_expiration: 1h\n", "jwt.access_expiration"),
        ("password:\n  bcrypt_cost: 3\n", "password.bcrypt_cost"),
        ("rate_limit:\n  max_requests: 0\n", "rate_limit.max_requests"),
        ("seed:\n  admin_email: nobody\n", "seed.admin_email"),
        ("seed:\n  admin_password: abc\n", "seed.admin_password"),
    ];

    for (section, field) in cases {
        let lookup = lookup_from(&[("GAUTH_JWT_SECRET", TEST_JWT_SECRET)]);
        let err = ConfigLoader::new()
            .load_with(section, ConfigFormat::Yaml, &lookup)
            .unwrap_err();

        assert!(err.is_validation(), "{}: {}", field, err);
        assert!(err.to_string().contains(field), "{}: {}", field, err);
    }
}

#[test]
fn test_validation_skips_disabled_sections() {
    let config = load_yaml(
        &format!(
            "jwt:\n  secret: {}\nrate_limit:\n  enabled: false\n  max_requests: 0\nseed:\n  enabled: false\n  admin_password: x\n",
            TEST_JWT_SECRET
        ),
        &[],
    )
    .unwrap();

    assert!(!config.rate_limit.enabled);
    assert!(!config.seed.enabled);
}
