//! Auth service: registration, login, token refresh and profile management
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - Token service holds pre-computed keys
//! - Storage is reached through the `UserRepository` trait object

use crate::auth::{PasswordService, TokenPair, TokenService};
use crate::error::AuthError;
use crate::repositories::{NewUser, RepositoryError, UserRecord, UserRepository};
use account_service_shared::validation::validate_required;
use account_service_shared::{Role, UpdateUserRequest, UserResponse};
use metrics::counter;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

/// Partial update: `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    /// Apply the supplied fields to `user`
    pub fn apply(&self, mut user: UserRecord) -> UserRecord {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user
    }
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            role: req.role,
        }
    }
}

/// Plaintext behind the hash verified for unknown emails
const UNKNOWN_USER_PASSWORD: &str = "unknown-user-placeholder-password";

/// Auth service orchestrating the credential store and token service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
    /// Hash checked when the email is unknown, so both login failures cost one verify
    unknown_user_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self {
            users,
            tokens,
            unknown_user_hash: Arc::new(OnceCell::new()),
        }
    }

    #[inline]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Burn one password verification against a throwaway hash
    async fn verify_unknown_user(&self, password: &str) -> Result<(), AuthError> {
        let hash = self
            .unknown_user_hash
            .get_or_try_init(|| PasswordService::hash_async(UNKNOWN_USER_PASSWORD.to_string()))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        PasswordService::verify_async(password.to_string(), hash.clone())
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(())
    }

    /// Register a new user
    ///
    /// Missing role defaults to `guest`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<UserResponse, AuthError> {
        validate_required(&[("name", name), ("email", email), ("password", password)])
            .map_err(AuthError::Validation)?;

        let password_hash = PasswordService::hash_async(password.to_string())
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                id: None,
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
                role: role.unwrap_or_default(),
            })
            .await?;

        counter!("auth_register_total").increment(1);
        info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(user.to_response())
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password are reported identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => {
                self.verify_unknown_user(password).await?;
                counter!("auth_login_total", "outcome" => "rejected").increment(1);
                warn!("Login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::Storage(e)),
        };

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !valid {
            counter!("auth_login_total", "outcome" => "rejected").increment(1);
            warn!("Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.tokens.generate_token_pair(user.id, user.role)?;

        counter!("auth_login_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "User logged in");

        Ok(pair)
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The new access token carries the user's current stored role. The
    /// presented refresh token is not invalidated.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.validate_and_extract(refresh_token).map_err(|e| {
            counter!("auth_refresh_total", "outcome" => "rejected").increment(1);
            warn!(error = %e, "Refresh token rejected");
            AuthError::InvalidRefreshToken
        })?;

        let user_id = claims.subject().ok_or_else(|| {
            counter!("auth_refresh_total", "outcome" => "rejected").increment(1);
            warn!("Refresh token rejected: malformed subject");
            AuthError::InvalidRefreshToken
        })?;

        let user = self.users.find_by_id(user_id).await?;
        let pair = self.tokens.generate_token_pair(user.id, user.role)?;

        counter!("auth_refresh_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "Tokens refreshed");

        Ok(pair)
    }

    /// Public view of a user
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self.users.find_by_id(id).await?;
        Ok(user.to_response())
    }

    /// Apply a partial update and persist the full record
    pub async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<UserResponse, AuthError> {
        let current = self.users.find_by_id(id).await?;
        let updated = self.users.update(&patch.apply(current)).await?;

        info!(user_id = %id, "User updated");
        Ok(updated.to_response())
    }

    /// Soft-delete a user after confirming it exists
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        self.users.find_by_id(id).await?;
        self.users.delete(id).await?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
