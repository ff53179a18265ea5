// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Default roles and administrator account.
//!
//! Seeding is idempotent: existing roles and users are left untouched.

use tracing::info;

use crate::error::StoreResult;
use crate::models::{NewRole, NewUser};
use crate::password::PasswordHasher;
use crate::permission::Role;
use crate::store::CredentialStore;

/// What to seed.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Administrator login name.
    pub admin_username: String,
    /// Administrator email.
    pub admin_email: String,
    /// Administrator plaintext password.
    pub admin_password: String,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_email: "admin@gauth.local".to_string(),
            admin_password: "password".to_string(),
        }
    }
}

/// What seeding created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Names of roles that were created.
    pub roles_created: Vec<String>,
    /// Whether the administrator account was created.
    pub admin_created: bool,
}

impl SeedReport {
    /// Returns `true` if nothing was created.
    pub fn is_noop(&self) -> bool {
        self.roles_created.is_empty() && !self.admin_created
    }
}

/// Creates the `admin` and `user` roles and the administrator account if
/// they are missing.
pub async fn seed_defaults(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    options: &SeedOptions,
) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    let mut admin_role = None;
    for role in [Role::Admin, Role::User] {
        let record = match store.find_role_by_name(role.as_str()).await? {
            Some(existing) => existing,
            None => {
                let created = store.create_role(NewRole::from_role(&role)).await?;
                report.roles_created.push(created.name.clone());
                created
            }
        };
        if role == Role::Admin {
            admin_role = Some(record);
        }
    }

    if store.find_user_by_login(&options.admin_username).await?.is_none() {
        let hash = hasher.hash_async(options.admin_password.clone()).await?;
        let admin = store
            .create_user(
                NewUser::new(&options.admin_username, &options.admin_email, hash)
                    .with_name("Admin", "User")
                    .verified(true),
            )
            .await?;
        if let Some(role) = admin_role {
            store.set_user_roles(admin.id, &[role.id]).await?;
        }
        report.admin_created = true;
    }

    info!(
        roles_created = report.roles_created.len(),
        admin_created = report.admin_created,
        "Seeding complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_seed_creates_defaults() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(4);
        let report = seed_defaults(&store, &hasher, &SeedOptions::default()).await.unwrap();

        assert_eq!(report.roles_created, vec!["admin", "user"]);
        assert!(report.admin_created);

        let admin = store.find_user_by_login("admin@gauth.local").await.unwrap().unwrap();
        assert!(admin.is_active);
        assert!(admin.is_verified);
        assert!(hasher.verify("password", &admin.password_hash));

        let roles = store.user_roles(admin.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert!(roles[0].grants(Permission::UserDelete));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let hasher = PasswordHasher::new(4);
        seed_defaults(&store, &hasher, &SeedOptions::default()).await.unwrap();
        let second = seed_defaults(&store, &hasher, &SeedOptions::default()).await.unwrap();

        assert!(second.is_noop());
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.list_roles().await.unwrap().len(), 2);
    }
}
