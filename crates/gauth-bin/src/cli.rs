// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the API server (default)
//! - `validate`: Validate the configuration file
//! - `migrate`: Apply database migrations
//! - `seed`: Create default roles and the administrator account
//! - `hash-password`: Print a bcrypt hash for a password
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// GAUTH - authentication and authorization service
///
/// Issues session-backed JWT access and refresh tokens, gates administrative
/// routes by role and records an audit trail for every request.
#[derive(Parser, Debug)]
#[command(
    name = "gauth",
    author = "Sylvex <contact@sylvex.io>",
    version = gauth_core::VERSION,
    about = "Authentication and authorization service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "gauth.yaml",
        env = "GAUTH_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact). Overrides the config file.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the GAUTH CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the API server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration without connecting to the
    /// database or binding a socket.
    Validate(ValidateArgs),

    /// Apply pending database migrations and exit
    Migrate,

    /// Create the default roles and administrator account and exit
    Seed,

    /// Print a bcrypt hash for a password
    #[command(name = "hash-password")]
    HashPassword(HashPasswordArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Skip database migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,

    /// Skip seeding default roles and the administrator
    #[arg(long)]
    pub skip_seed: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `hash-password` command.
#[derive(Args, Debug, Clone)]
pub struct HashPasswordArgs {
    /// Password to hash
    #[arg(required_unless_present = "stdin")]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long)]
    pub stdin: bool,

    /// bcrypt work factor (defaults to the configured cost)
    #[arg(long)]
    pub cost: Option<u32>,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<gauth_config::LogFormat> for LogFormat {
    fn from(format: gauth_config::LogFormat) -> Self {
        match format {
            gauth_config::LogFormat::Text => LogFormat::Text,
            gauth_config::LogFormat::Json => LogFormat::Json,
            gauth_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Returns `true` if the command reads the configuration file.
    pub fn needs_config(&self) -> bool {
        !matches!(
            self.command,
            Some(Commands::Version) | Some(Commands::HashPassword(_))
        )
    }

    /// Resolves the log level from the flags, falling back to `configured`.
    ///
    /// `-q` and `-v` win over `--log-level`, which wins over the config file.
    pub fn effective_log_level<'a>(&'a self, configured: Option<&'a str>) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else if let Some(level) = self.log_level.as_deref() {
            level
        } else {
            configured.unwrap_or("info")
        }
    }

    /// Resolves the log format from the flag, falling back to `configured`.
    pub fn effective_log_format(&self, configured: Option<LogFormat>) -> LogFormat {
        self.log_format.or(configured).unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
