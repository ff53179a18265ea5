// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! `RUST_LOG`, when set, replaces the filter built from the configured level.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;
use crate::error::{BinError, BinResult};

/// Per-crate directives appended to the configured level.
const NOISY_CRATES: &str = "hyper=warn,sqlx=warn,tower_http=info";

// =============================================================================
// Logging Initialization
// =============================================================================

/// Installs the global tracing subscriber.
///
/// Fails if `level` is not a valid filter or a subscriber is already set.
///
/// ```ignore
/// use gauth_bin::cli::LogFormat;
/// use gauth_bin::logging::init_logging;
///
/// init_logging("info", LogFormat::Json)?;
/// ```
pub fn init_logging(level: &str, format: LogFormat) -> BinResult<()> {
    let env_filter = build_filter(level)?;

    match format {
        LogFormat::Text => init_text_logging(env_filter),
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Compact => init_compact_logging(env_filter),
    }
}

/// Builds the filter from `RUST_LOG` or from `level` plus the crate directives.
pub fn build_filter(level: &str) -> BinResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    filter_for_level(level)
}

fn filter_for_level(level: &str) -> BinResult<EnvFilter> {
    let level = level.trim().to_ascii_lowercase();
    if level.parse::<Level>().is_err() {
        return Err(BinError::config(format!("Invalid log level '{}'", level)));
    }

    EnvFilter::try_new(format!("{},{}", level, NOISY_CRATES))
        .map_err(|e| BinError::config(format!("Invalid log filter: {}", e)))
}

fn init_text_logging(filter: EnvFilter) -> BinResult<()> {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(is_terminal),
        )
        .try_init()
        .map_err(|e| BinError::init(format!("Failed to install logger: {}", e)))
}

fn init_json_logging(filter: EnvFilter) -> BinResult<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init()
        .map_err(|e| BinError::init(format!("Failed to install logger: {}", e)))
}

fn init_compact_logging(filter: EnvFilter) -> BinResult<()> {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(is_terminal),
        )
        .try_init()
        .map_err(|e| BinError::init(format!("Failed to install logger: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_level() {
        for level in ["trace", "DEBUG", "Info", "warn", "error"] {
            assert!(filter_for_level(level).is_ok(), "level {}", level);
        }
    }

    #[test]
    fn test_filter_rejects_unknown_level() {
        let err = filter_for_level("loud").unwrap_err();
        assert!(err.to_string().contains("loud"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_filter_includes_crate_directives() {
        let filter = filter_for_level("debug").unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("sqlx=warn"));
        assert!(rendered.contains("hyper=warn"));
    }
}
