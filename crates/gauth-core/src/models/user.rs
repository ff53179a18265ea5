// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::RoleRecord;
use crate::permission::{PermissionSet, Role};

/// A user account.
///
/// The password hash is never serialized, so a `User` can be returned from
/// any endpoint as-is.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// bcrypt hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Avatar URL.
    pub avatar: String,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Whether the email address was verified.
    pub is_verified: bool,
    /// Time of the last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Deleted users are invisible to every lookup.
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns `true` if the user has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if `search` occurs case-insensitively in the username,
    /// email, first name or last name.
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        [&self.username, &self.email, &self.first_name, &self.last_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A user together with the roles assigned to it.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    /// The account.
    #[serde(flatten)]
    pub user: User,
    /// Assigned roles.
    pub roles: Vec<RoleRecord>,
}

impl UserWithRoles {
    /// Pairs a user with its roles.
    pub fn new(user: User, roles: Vec<RoleRecord>) -> Self {
        Self { user, roles }
    }

    /// Returns the typed names of active roles.
    pub fn role_names(&self) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|r| r.is_active)
            .map(RoleRecord::role)
            .collect()
    }

    /// Returns the union of permissions across active roles.
    pub fn permissions(&self) -> PermissionSet {
        let mut set = PermissionSet::new();
        for role in self.roles.iter().filter(|r| r.is_active) {
            set.merge(&role.permission_set());
        }
        set
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Already hashed password.
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Avatar URL.
    pub avatar: String,
    /// Initial active flag.
    pub is_active: bool,
    /// Initial verified flag.
    pub is_verified: bool,
}

impl NewUser {
    /// Creates an active, unverified user with empty profile fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: String::new(),
            last_name: String::new(),
            avatar: String::new(),
            is_active: true,
            is_verified: false,
        }
    }

    /// Sets the first and last name.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Sets the verified flag.
    pub fn verified(mut self, verified: bool) -> Self {
        self.is_verified = verified;
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

/// Partial update of a user. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New verified flag.
    pub is_verified: Option<bool>,
}

impl UserChanges {
    /// Applies the changes to a user in place and bumps `updated_at`.
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(v) = self.username {
            user.username = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.avatar {
            user.avatar = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
        if let Some(v) = self.is_verified {
            user.is_verified = v;
        }
        user.updated_at = now;
    }
}

/// Listing query with already-normalized paging.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
    /// Case-insensitive substring filter.
    pub search: Option<String>,
}

/// One page of users plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct UserPage {
    /// Users on this page.
    pub users: Vec<User>,
    /// Total matching users across all pages.
    pub total: u64,
}
