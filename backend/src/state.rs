//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys are derived once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::repositories::UserRepository;
use crate::services::AuthService;
use std::sync::Arc;

/// Shared application state
///
/// - `users`: trait object behind an Arc, cloning is O(1)
/// - `config`: Wrapped in Arc, cloning is O(1)
/// - `tokens`: Pre-computed keys wrapped in Arc, cloning is O(1)
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state
    ///
    /// Derives the signing keys from the configured secret, so call this
    /// once at application startup.
    pub fn new(users: Arc<dyn UserRepository>, config: AppConfig) -> Self {
        let tokens = TokenService::from_config(&config.jwt);
        let auth = AuthService::new(users.clone(), tokens.clone());

        Self {
            users,
            config: Arc::new(config),
            tokens,
            auth,
        }
    }

    #[inline]
    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
