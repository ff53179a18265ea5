// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory credential store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::CredentialStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewPolicy, NewRole, NewSession, NewUser, Policy, RoleRecord, Session, User, UserChanges,
    UserPage, UserQuery,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, RoleRecord>,
    user_roles: HashMap<Uuid, Vec<Uuid>>,
    policies: HashMap<Uuid, Policy>,
    sessions: HashMap<String, Session>,
}

impl MemoryState {
    fn live_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| !u.is_deleted())
    }

    fn identity_taken(&self, username: Option<&str>, email: Option<&str>, exclude: Option<Uuid>) -> bool {
        self.live_users().any(|u| {
            Some(u.id) != exclude
                && (username == Some(u.username.as_str()) || email == Some(u.email.as_str()))
        })
    }

    fn roles_of(&self, user_id: Uuid) -> Vec<RoleRecord> {
        let mut roles: Vec<RoleRecord> = self
            .user_roles
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.roles.get(id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

/// Credential store backed by in-process maps.
///
/// Cloning is cheap and all clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live users.
    pub fn user_count(&self) -> usize {
        self.state.read().live_users().count()
    }

    /// Returns the number of sessions, active or not.
    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    /// Overrides a session's expiry.
    pub fn set_session_expiry(&self, token: &str, expires_at: chrono::DateTime<Utc>) -> bool {
        match self.state.write().sessions.get_mut(token) {
            Some(session) => {
                session.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let state = self.state.read();
        let user = state
            .live_users()
            .find(|u| u.username == login || u.email == login)
            .cloned();
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read();
        let user = state.users.get(&id).filter(|u| !u.is_deleted()).cloned();
        Ok(user)
    }

    async fn list_users(&self, query: &UserQuery) -> StoreResult<UserPage> {
        let state = self.state.read();
        let mut matched: Vec<&User> = state
            .live_users()
            .filter(|u| query.search.as_deref().map_or(true, |s| u.matches_search(s)))
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = matched.len() as u64;
        let users = matched
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(UserPage { users, total })
    }

    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        Ok(self.state.read().identity_taken(username, email, exclude))
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write();
        if state.identity_taken(Some(&new_user.username), Some(&new_user.email), None) {
            return Err(StoreError::conflict("Username or email already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            avatar: new_user.avatar,
            is_active: new_user.is_active,
            is_verified: new_user.is_verified,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let mut state = self.state.write();
        if state.identity_taken(changes.username.as_deref(), changes.email.as_deref(), Some(id)) {
            return Err(StoreError::conflict("Username or email already exists"));
        }

        let user = state
            .users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| StoreError::not_found("user"))?;
        changes.apply(user, Utc::now());
        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| StoreError::not_found("user"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        if let Some(user) = state.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| StoreError::not_found("user"))?;
        let now = Utc::now();
        user.deleted_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn user_roles(&self, user_id: Uuid) -> StoreResult<Vec<RoleRecord>> {
        Ok(self.state.read().roles_of(user_id))
    }

    async fn roles_for_users(&self, user_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<RoleRecord>>> {
        let state = self.state.read();
        let roles = user_ids.iter().map(|id| (*id, state.roles_of(*id))).collect();
        Ok(roles)
    }

    async fn set_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> StoreResult<()> {
        let mut state = self.state.write();
        let mut known: Vec<Uuid> = role_ids
            .iter()
            .copied()
            .filter(|id| state.roles.contains_key(id))
            .collect();
        known.sort_unstable();
        known.dedup();
        state.user_roles.insert(user_id, known);
        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<RoleRecord>> {
        let state = self.state.read();
        let role = state.roles.values().find(|r| r.name == name).cloned();
        Ok(role)
    }

    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>> {
        let mut roles: Vec<RoleRecord> = self.state.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn create_role(&self, new_role: NewRole) -> StoreResult<RoleRecord> {
        let mut state = self.state.write();
        if state.roles.values().any(|r| r.name == new_role.name) {
            return Err(StoreError::conflict(format!("Role '{}' already exists", new_role.name)));
        }

        let now = Utc::now();
        let role = RoleRecord {
            id: Uuid::now_v7(),
            permissions: new_role.permission_names(),
            name: new_role.name,
            description: new_role.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn list_policies(&self) -> StoreResult<Vec<Policy>> {
        let mut policies: Vec<Policy> = self.state.read().policies.values().cloned().collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn create_policy(&self, new_policy: NewPolicy) -> StoreResult<Policy> {
        let mut state = self.state.write();
        if state.policies.values().any(|p| p.name == new_policy.name) {
            return Err(StoreError::conflict(format!(
                "Policy '{}' already exists",
                new_policy.name
            )));
        }

        let now = Utc::now();
        let policy = Policy {
            id: Uuid::now_v7(),
            name: new_policy.name,
            description: new_policy.description,
            resource: new_policy.resource,
            action: new_policy.action,
            effect: new_policy.effect,
            conditions: new_policy.conditions,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.policies.insert(policy.id, policy.clone());
        Ok(policy)
    }

    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session> {
        let mut state = self.state.write();
        if state.sessions.contains_key(&new_session.token) {
            return Err(StoreError::conflict("Session token already exists"));
        }

        let session = Session {
            id: Uuid::now_v7(),
            user_id: new_session.user_id,
            token: new_session.token,
            expires_at: new_session.expires_at,
            ip_address: new_session.ip_address,
            user_agent: new_session.user_agent,
            is_active: true,
            created_at: Utc::now(),
        };
        state.sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find_active_session(&self, token: &str, user_id: Uuid) -> StoreResult<Option<Session>> {
        let state = self.state.read();
        let session = state
            .sessions
            .get(token)
            .filter(|s| s.user_id == user_id && s.is_active)
            .cloned();
        Ok(session)
    }

    async fn deactivate_session(&self, token: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.sessions.get_mut(token) {
            Some(session) if session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Role;
    use chrono::Duration;

    fn new_user(name: &str) -> NewUser {
        NewUser::new(name, format!("{}@example.com", name), "hash")
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();

        let by_name = store.find_user_by_login("alice").await.unwrap().unwrap();
        let by_email = store.find_user_by_login("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(store.find_user_by_login("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let err = store.create_user(new_user("alice")).await.unwrap_err();
        assert!(err.is_conflict());

        let same_email = NewUser::new("alice2", "alice@example.com", "hash");
        assert!(store.create_user(same_email).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();

        store.delete_user(user.id).await.unwrap();
        assert!(store.get_user(user.id).await.unwrap().is_none());
        assert!(store.find_user_by_login("alice").await.unwrap().is_none());
        assert!(store.delete_user(user.id).await.unwrap_err().is_not_found());
        assert_eq!(store.user_count(), 0);

        // The name is free again once the holder is deleted.
        store.create_user(new_user("alice")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_users_paging_and_search() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.create_user(new_user(&format!("user{:02}", i))).await.unwrap();
        }

        let page = store
            .list_users(&UserQuery { offset: 10, limit: 10, search: None })
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.users.len(), 10);

        let tail = store
            .list_users(&UserQuery { offset: 20, limit: 10, search: None })
            .await
            .unwrap();
        assert_eq!(tail.users.len(), 5);

        let searched = store
            .list_users(&UserQuery { offset: 0, limit: 10, search: Some("USER1".into()) })
            .await
            .unwrap();
        assert_eq!(searched.total, 10);
    }

    #[tokio::test]
    async fn test_list_users_search_wildcards_are_literal() {
        let store = MemoryStore::new();
        store.create_user(new_user("snake_case")).await.unwrap();
        store.create_user(new_user("camelCase")).await.unwrap();
        store.create_user(new_user("percent")).await.unwrap();

        let underscored = store
            .list_users(&UserQuery { offset: 0, limit: 10, search: Some("_".into()) })
            .await
            .unwrap();
        assert_eq!(underscored.total, 1);
        assert_eq!(underscored.users[0].username, "snake_case");

        let percent = store
            .list_users(&UserQuery { offset: 0, limit: 10, search: Some("%".into()) })
            .await
            .unwrap();
        assert_eq!(percent.total, 0);
    }

    #[tokio::test]
    async fn test_list_users_offset_past_end() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let page = store
            .list_users(&UserQuery { offset: u64::MAX, limit: 100, search: None })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.users.is_empty());
    }

    #[tokio::test]
    async fn test_update_user_conflict() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        store.create_user(new_user("bob")).await.unwrap();

        let changes = UserChanges {
            username: Some("bob".into()),
            ..Default::default()
        };
        assert!(store.update_user(alice.id, changes).await.unwrap_err().is_conflict());

        let rename = UserChanges {
            username: Some("alice".into()),
            first_name: Some("Alice".into()),
            ..Default::default()
        };
        let updated = store.update_user(alice.id, rename).await.unwrap();
        assert_eq!(updated.first_name, "Alice");
    }

    #[tokio::test]
    async fn test_roles_assignment() {
        let store = MemoryStore::new();
        let admin = store.create_role(NewRole::from_role(&Role::Admin)).await.unwrap();
        let user_role = store.create_role(NewRole::from_role(&Role::User)).await.unwrap();
        let user = store.create_user(new_user("alice")).await.unwrap();

        store
            .set_user_roles(user.id, &[user_role.id, admin.id, Uuid::now_v7()])
            .await
            .unwrap();
        let roles = store.user_roles(user.id).await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "user"]);

        store.set_user_roles(user.id, &[user_role.id]).await.unwrap();
        assert_eq!(store.user_roles(user.id).await.unwrap().len(), 1);

        assert!(store
            .create_role(NewRole::from_role(&Role::Admin))
            .await
            .unwrap_err()
            .is_conflict());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let session = store
            .create_session(NewSession::issue(user.id, Duration::hours(1)))
            .await
            .unwrap();

        assert!(store
            .find_active_session(&session.token, user.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_active_session(&session.token, Uuid::now_v7())
            .await
            .unwrap()
            .is_none());

        assert!(store.deactivate_session(&session.token).await.unwrap());
        assert!(!store.deactivate_session(&session.token).await.unwrap());
        assert!(store
            .find_active_session(&session.token, user.id)
            .await
            .unwrap()
            .is_none());
    }
}
