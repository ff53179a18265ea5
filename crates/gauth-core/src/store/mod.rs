// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential store abstraction.
//!
//! The [`CredentialStore`] trait is the persistence boundary for users,
//! roles, policies and sessions. Two implementations are provided:
//!
//! - [`MemoryStore`]: `RwLock`-protected maps, used by tests and the
//!   `memory` backend
//! - [`PostgresStore`]: `sqlx` connection pool against PostgreSQL
//!
//! All user lookups exclude soft-deleted accounts.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgStoreOptions, PostgresStore};

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    NewPolicy, NewRole, NewSession, NewUser, Policy, RoleRecord, Session, User, UserChanges,
    UserPage, UserQuery, UserWithRoles,
};

/// Persistence operations required by the authentication service.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    /// Finds a user whose username or email equals `login`.
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    /// Finds a user by id.
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Returns one page of users ordered by creation time.
    async fn list_users(&self, query: &UserQuery) -> StoreResult<UserPage>;

    /// Returns `true` if another user already owns `username` or `email`.
    ///
    /// `exclude` skips the user being updated.
    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool>;

    /// Inserts a user. Fails with `Conflict` on a duplicate username or email.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Applies a partial update. Fails with `NotFound` if the user is absent.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User>;

    /// Replaces the password hash.
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    /// Stamps `last_login_at` with the current time.
    async fn touch_last_login(&self, id: Uuid) -> StoreResult<()>;

    /// Soft-deletes a user. Fails with `NotFound` if the user is absent.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    // =========================================================================
    // Roles
    // =========================================================================

    /// Returns the roles assigned to a user, ordered by name.
    async fn user_roles(&self, user_id: Uuid) -> StoreResult<Vec<RoleRecord>>;

    /// Returns the roles of several users at once.
    async fn roles_for_users(&self, user_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<RoleRecord>>> {
        let mut out = HashMap::with_capacity(user_ids.len());
        for id in user_ids {
            out.insert(*id, self.user_roles(*id).await?);
        }
        Ok(out)
    }

    /// Replaces the user's role assignments. Unknown role ids are ignored.
    async fn set_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> StoreResult<()>;

    /// Finds a role by name.
    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<RoleRecord>>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>>;

    /// Inserts a role. Fails with `Conflict` on a duplicate name.
    async fn create_role(&self, new_role: NewRole) -> StoreResult<RoleRecord>;

    // =========================================================================
    // Policies
    // =========================================================================

    /// Lists all policies ordered by name.
    async fn list_policies(&self) -> StoreResult<Vec<Policy>>;

    /// Inserts a policy. Fails with `Conflict` on a duplicate name.
    async fn create_policy(&self, new_policy: NewPolicy) -> StoreResult<Policy>;

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Persists a new session.
    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session>;

    /// Finds the active session with this token owned by this user.
    ///
    /// Expiry is not checked here; callers compare `expires_at` themselves.
    async fn find_active_session(&self, token: &str, user_id: Uuid) -> StoreResult<Option<Session>>;

    /// Marks the session inactive. Returns `false` if no active session matched.
    async fn deactivate_session(&self, token: &str) -> StoreResult<bool>;

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Returns the backend name.
    fn name(&self) -> &str;

    /// Verifies the backend is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Loads a user with roles.
    async fn get_user_with_roles(&self, id: Uuid) -> StoreResult<Option<UserWithRoles>> {
        match self.get_user(id).await? {
            Some(user) => {
                let roles = self.user_roles(id).await?;
                Ok(Some(UserWithRoles::new(user, roles)))
            }
            None => Ok(None),
        }
    }
}
