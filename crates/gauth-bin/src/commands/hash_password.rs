// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use gauth_core::PasswordHasher;

use crate::cli::HashPasswordArgs;
use crate::error::{BinError, BinResult};

/// Prints a bcrypt hash suitable for the `users.password_hash` column.
pub fn hash_password(args: HashPasswordArgs) -> BinResult<()> {
    let password = match args.password {
        Some(password) if !args.stdin => password,
        _ => read_password(std::io::stdin().lock())?,
    };
    if password.is_empty() {
        return Err(BinError::config("Password cannot be empty"));
    }

    let cost = args.cost.unwrap_or_else(|| PasswordHasher::default().cost());
    if !(4..=31).contains(&cost) {
        return Err(BinError::config("bcrypt cost must be between 4 and 31"));
    }

    let hash = PasswordHasher::new(cost).hash(&password)?;
    println!("{}", hash);
    Ok(())
}

/// Reads one line, without its line terminator.
pub fn read_password(mut reader: impl BufRead) -> BinResult<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
