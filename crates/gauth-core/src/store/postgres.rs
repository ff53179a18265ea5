// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! PostgreSQL credential store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::CredentialStore;
use crate::audit::{AuditFilter, AuditLog, AuditLogger, AuditResult};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewPolicy, NewRole, NewSession, NewUser, Policy, PolicyEffect, RoleRecord, Session, User,
    UserChanges, UserPage, UserQuery,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, avatar, \
     is_active, is_verified, last_login_at, created_at, updated_at, deleted_at";

const ROLE_COLUMNS: &str =
    "r.id, r.name, r.description, r.permissions, r.is_active, r.created_at, r.updated_at";

const POLICY_COLUMNS: &str = "id, name, description, resource, action, effect, conditions, \
     is_active, created_at, updated_at";

const AUDIT_COLUMNS: &str = "id, created_at, user_id, action, resource, resource_id, details, \
     ip_address, user_agent, success";

/// Escapes `LIKE` metacharacters so the input matches literally under `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds a substring pattern for `ILIKE ... ESCAPE '\'`.
fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

/// Converts a row count to a `BIGINT` bind, or `None` when it does not fit.
fn bind_count(value: u64) -> Option<i64> {
    i64::try_from(value).ok()
}

// =============================================================================
// Options
// =============================================================================

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PgStoreOptions {
    /// Maximum pool size.
    pub max_connections: u32,
    /// Connections kept open when idle.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
    /// Idle connections are closed after this long.
    pub idle_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    permissions: Json<Vec<String>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            permissions: row.permissions.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    #[sqlx(flatten)]
    role: RoleRow,
}

#[derive(FromRow)]
struct PolicyRow {
    id: Uuid,
    name: String,
    description: String,
    resource: String,
    action: String,
    effect: String,
    conditions: Json<serde_json::Map<String, serde_json::Value>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        let effect = PolicyEffect::parse(&row.effect).unwrap_or_else(|| {
            warn!(policy = %row.name, effect = %row.effect, "Unknown policy effect, treating as deny");
            PolicyEffect::Deny
        });
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            resource: row.resource,
            action: row.action,
            effect,
            conditions: row.conditions.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    user_id: Option<Uuid>,
    action: String,
    resource: String,
    resource_id: Option<String>,
    details: Json<serde_json::Value>,
    ip_address: String,
    user_agent: String,
    success: bool,
}

impl From<AuditRow> for AuditLog {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            user_id: row.user_id,
            action: row.action,
            resource: row.resource,
            resource_id: row.resource_id,
            details: row.details.0,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            success: row.success,
        }
    }
}

// =============================================================================
// PostgresStore
// =============================================================================

/// Credential store and audit sink backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects a new pool.
    pub async fn connect(database_url: &str, options: &PgStoreOptions) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout)
            .idle_timeout(options.idle_timeout)
            .connect(database_url)
            .await?;

        info!(max_connections = options.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Closes all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE (username = $1 OR email = $1) AND deleted_at IS NULL \
             LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, query: &UserQuery) -> StoreResult<UserPage> {
        let pattern = query.search.as_deref().map(contains_pattern);

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users \
             WHERE deleted_at IS NULL \
               AND ($1::text IS NULL OR username ILIKE $1 ESCAPE '\\' \
                    OR email ILIKE $1 ESCAPE '\\' \
                    OR first_name ILIKE $1 ESCAPE '\\' \
                    OR last_name ILIKE $1 ESCAPE '\\')",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        let total = total.0.max(0) as u64;

        // Pages beyond what OFFSET can address are empty.
        let Some(offset) = bind_count(query.offset) else {
            return Ok(UserPage { users: Vec::new(), total });
        };

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE deleted_at IS NULL \
               AND ($1::text IS NULL OR username ILIKE $1 ESCAPE '\\' \
                    OR email ILIKE $1 ESCAPE '\\' \
                    OR first_name ILIKE $1 ESCAPE '\\' \
                    OR last_name ILIKE $1 ESCAPE '\\') \
             ORDER BY created_at, id \
             OFFSET $2 LIMIT $3"
        ))
        .bind(&pattern)
        .bind(offset)
        .bind(bind_count(query.limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(UserPage { users, total })
    }

    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        if username.is_none() && email.is_none() {
            return Ok(false);
        }

        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM users \
                WHERE deleted_at IS NULL \
                  AND ($3::uuid IS NULL OR id <> $3) \
                  AND (username = $1 OR email = $2))",
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken.0)
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password_hash, first_name, last_name, \
                                avatar, is_active, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.avatar)
        .bind(new_user.is_active)
        .bind(new_user.is_verified)
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let mut user = self
            .get_user(id)
            .await?
            .ok_or_else(|| StoreError::not_found("user"))?;
        changes.apply(&mut user, Utc::now());

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $2, email = $3, first_name = $4, last_name = $5, \
                    avatar = $6, is_active = $7, is_verified = $8, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(user.is_verified)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("user"))?;

        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user"));
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user"));
        }
        Ok(())
    }

    async fn user_roles(&self, user_id: Uuid) -> StoreResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn roles_for_users(&self, user_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<RoleRecord>>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(&format!(
            "SELECT ur.user_id, {ROLE_COLUMNS} FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = ANY($1) \
             ORDER BY r.name"
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut out: HashMap<Uuid, Vec<RoleRecord>> =
            user_ids.iter().map(|id| (*id, Vec::new())).collect();
        for row in rows {
            out.entry(row.user_id).or_default().push(row.role.into());
        }
        Ok(out)
    }

    async fn set_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT $1, r.id FROM roles r WHERE r.id = ANY($2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE r.name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RoleRecord::from))
    }

    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles r ORDER BY r.name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn create_role(&self, new_role: NewRole) -> StoreResult<RoleRecord> {
        let row = sqlx::query_as::<_, RoleRow>(
            "INSERT INTO roles (id, name, description, permissions) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, description, permissions, is_active, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(&new_role.name)
        .bind(&new_role.description)
        .bind(Json(new_role.permission_names()))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_policies(&self) -> StoreResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Policy::from).collect())
    }

    async fn create_policy(&self, new_policy: NewPolicy) -> StoreResult<Policy> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "INSERT INTO policies (id, name, description, resource, action, effect, conditions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {POLICY_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&new_policy.name)
        .bind(&new_policy.description)
        .bind(&new_policy.resource)
        .bind(&new_policy.action)
        .bind(new_policy.effect.as_str())
        .bind(Json(&new_policy.conditions))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, token, expires_at, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, token, expires_at, ip_address, user_agent, is_active, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(new_session.user_id)
        .bind(&new_session.token)
        .bind(new_session.expires_at)
        .bind(&new_session.ip_address)
        .bind(&new_session.user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_active_session(&self, token: &str, user_id: Uuid) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, token, expires_at, ip_address, user_agent, is_active, created_at \
             FROM sessions \
             WHERE token = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(token)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn deactivate_session(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE WHERE token = $1 AND is_active = TRUE",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    fn name(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AuditLogger for PostgresStore {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (id, created_at, user_id, action, resource, resource_id, \
                                     details, ip_address, user_agent, success) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.id)
        .bind(entry.created_at)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(&entry.resource_id)
        .bind(Json(&entry.details))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.success)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(action) = filter.action {
            builder.push(" AND action = ").push_bind(action);
        }
        if let Some(prefix) = filter.resource_prefix {
            builder
                .push(" AND resource LIKE ")
                .push_bind(format!("{}%", escape_like(&prefix)))
                .push(" ESCAPE '\\'");
        }
        if let Some(success) = filter.success {
            builder.push(" AND success = ").push_bind(success);
        }
        if let Some(since) = filter.since {
            builder.push(" AND created_at >= ").push_bind(since);
        }
        builder.push(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            builder
                .push(" LIMIT ")
                .push_bind(bind_count(limit as u64).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_as::<AuditRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(AuditLog::from).collect())
    }

    fn name(&self) -> &str {
        "postgres"
    }

    fn supports_query(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("ali"), "%ali%");
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(escape_like("user_1%"), r"user\_1\%");
    }

    #[test]
    fn test_bind_count_rejects_overflow() {
        assert_eq!(bind_count(0), Some(0));
        assert_eq!(bind_count(i64::MAX as u64), Some(i64::MAX));
        assert_eq!(bind_count(i64::MAX as u64 + 1), None);
        assert_eq!(bind_count(u64::MAX), None);
    }
}
