// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use gauth_config::schema::MIN_SECRET_LEN;
use gauth_config::{Environment, GauthConfig, StoreBackend};
use gauth_core::seed::SeedOptions;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::{ConfigSource, LoadedConfig};

/// Prints a summary of an already loaded and validated configuration.
///
/// Loading enforces hard errors. This command adds warnings for settings
/// that are valid but risky; `--strict` turns them into a failure.
pub fn validate(args: ValidateArgs, loaded: &LoadedConfig) -> BinResult<()> {
    let config = &loaded.config;
    let source = match loaded.source {
        ConfigSource::File(ref path) => path.display().to_string(),
        ConfigSource::Environment => "environment".to_string(),
    };
    let warnings = collect_warnings(config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", source);
            println!();
            println!("Summary:");
            println!("  Environment: {}", config.server.environment);
            println!("  Listen: {}", config.server.socket_addr());
            println!("  Store: {}", backend_name(config.database.backend));
            println!(
                "  Access token: {}",
                humantime::format_duration(config.jwt.access_expiration)
            );
            println!(
                "  Refresh token: {}",
                humantime::format_duration(config.jwt.refresh_expiration)
            );
            println!(
                "  Rate limit: {}",
                if config.rate_limit.enabled {
                    format!(
                        "{} per {}",
                        config.rate_limit.max_requests,
                        humantime::format_duration(config.rate_limit.window)
                    )
                } else {
                    "disabled".to_string()
                }
            );
            println!("  Audit: {}", if config.audit.enabled { "enabled" } else { "disabled" });

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(config)
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "source": source,
                "summary": {
                    "environment": config.server.environment.as_str(),
                    "listen": config.server.socket_addr().to_string(),
                    "store": backend_name(config.database.backend),
                    "access_expiration_secs": config.jwt.access_expiration.as_secs(),
                    "refresh_expiration_secs": config.jwt.refresh_expiration.as_secs(),
                    "rate_limit_enabled": config.rate_limit.enabled,
                    "audit_enabled": config.audit.enabled,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(config) } else { None },
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", rendered);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Lists settings that are accepted but unsafe or unusual.
pub fn collect_warnings(config: &GauthConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let production = config.server.environment == Environment::Production;

    if config.jwt.secret.len() < MIN_SECRET_LEN {
        warnings.push(format!(
            "JWT secret is shorter than {} bytes",
            MIN_SECRET_LEN
        ));
    }

    if config.seed.enabled && config.seed.admin_password == SeedOptions::default().admin_password {
        warnings.push("Administrator is seeded with the default password".to_string());
    }

    if config.database.backend == StoreBackend::Memory {
        warnings.push("In-memory store: data is lost on restart".to_string());
    }

    let any_origin = config.cors.allowed_origins.iter().any(|o| o == "*");
    if any_origin && config.cors.allow_credentials {
        warnings.push("CORS allows any origin; credentials will not be allowed".to_string());
    } else if any_origin && production {
        warnings.push("CORS allows any origin in production".to_string());
    }

    if !config.rate_limit.enabled {
        warnings.push("Rate limiting is disabled".to_string());
    }

    if !config.audit.enabled {
        warnings.push("Audit logging is disabled".to_string());
    }

    warnings
}

fn backend_name(backend: StoreBackend) -> &'static str {
    match backend {
        StoreBackend::Postgres => "postgres",
        StoreBackend::Memory => "memory",
    }
}
