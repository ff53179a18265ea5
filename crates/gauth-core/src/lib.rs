// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gauth-core
//!
//! Domain model and persistence abstractions for the GAUTH authentication
//! service.
//!
//! This crate provides the foundational types and traits used by the API and
//! binary crates:
//!
//! - **Models**: `User`, `RoleRecord`, `Session`, `Policy` and their input types
//! - **Permission**: Typed `Permission` / `Role` enums and `PermissionSet`
//! - **Password**: bcrypt hashing and verification
//! - **Store**: The `CredentialStore` trait with in-memory and PostgreSQL backends
//! - **Audit**: Append-only audit records and the `AuditLogger` trait
//! - **Seed**: Idempotent default roles and administrator account
//!
//! ## Example
//!
//! ```rust,ignore
//! use gauth_core::store::{CredentialStore, MemoryStore};
//! use gauth_core::password::PasswordHasher;
//! use gauth_core::seed::{seed_defaults, SeedOptions};
//!
//! let store = MemoryStore::new();
//! let hasher = PasswordHasher::default();
//! seed_defaults(&store, &hasher, &SeedOptions::default()).await?;
//!
//! let admin = store.find_user_by_login("admin").await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod audit;
pub mod error;
pub mod models;
pub mod password;
pub mod permission;
pub mod seed;
pub mod store;

pub use audit::{AuditFilter, AuditLog, AuditLogger, InMemoryAuditLogger, NoOpAuditLogger};
pub use error::{StoreError, StoreResult};
pub use models::{
    NewPolicy, NewRole, NewSession, NewUser, Policy, PolicyEffect, RoleRecord, Session, User,
    UserChanges, UserPage, UserQuery, UserWithRoles,
};
pub use password::{PasswordError, PasswordHasher};
pub use permission::{Permission, PermissionSet, Role};
pub use store::{CredentialStore, MemoryStore, PostgresStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
