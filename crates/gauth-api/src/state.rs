// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use gauth_core::{AuditLogger, CredentialStore, NoOpAuditLogger, PasswordHasher};

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionIssuer;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// This is the central state container that is passed to all handlers via
/// Axum's state extraction mechanism.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Credential store.
    pub store: Arc<dyn CredentialStore>,
    /// Audit logger.
    pub audit_logger: Arc<dyn AuditLogger>,
    /// JWT manager for token operations.
    pub jwt_manager: Arc<JwtManager>,
    /// Session issuer for login, refresh and logout.
    pub sessions: Arc<SessionIssuer>,
    /// Password hasher for new and changed passwords.
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the credential store.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Returns the session issuer.
    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.name())
            .field("audit_logger", &self.audit_logger.name())
            .field("sessions", &self.sessions)
            .finish()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
    jwt_manager: Option<Arc<JwtManager>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the credential store.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.jwt_manager = Some(manager);
        self
    }

    /// Builds the AppState.
    ///
    /// The JWT manager is derived from the configuration unless one was set.
    /// Without an audit logger, audit records are discarded.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        let store = self
            .store
            .ok_or_else(|| ApiError::internal("AppState requires a credential store"))?;

        let jwt_manager = match self.jwt_manager {
            Some(manager) => manager,
            None => Arc::new(JwtManager::new(config.jwt.clone())?),
        };

        let audit_logger = self
            .audit_logger
            .unwrap_or_else(|| Arc::new(NoOpAuditLogger));

        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let sessions = Arc::new(SessionIssuer::new(
            store.clone(),
            jwt_manager.clone(),
            hasher,
        ));

        Ok(AppState {
            config: Arc::new(config),
            store,
            audit_logger,
            jwt_manager,
            sessions,
            hasher,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_manager.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<SessionIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<dyn CredentialStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
