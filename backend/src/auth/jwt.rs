//! JWT token generation and validation
//!
//! Issues access/refresh token pairs and validates them with pre-computed
//! HMAC keys. Access tokens carry `{sub, role, exp}`; refresh tokens carry
//! `{sub, exp}` only, so the role is always re-read from storage on refresh.

use account_service_shared::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Refresh token lifetime (7 days)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token service failures
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// HMAC signing secret
///
/// Built once at startup and shared read-only; the raw bytes are only
/// exposed to key derivation.
#[derive(Clone)]
pub struct SigningSecret(Arc<SecretString>);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::new(secret.into())))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Claims written into minted tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    exp: i64,
}

/// Claims read back from a token whose signature and expiry checked out
///
/// `sub` and `role` are kept untyped: a correctly signed token with a
/// malformed payload is a distinct failure from a bad signature, and callers
/// decide how to treat it.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub role: Option<Value>,
    pub exp: i64,
}

impl TokenClaims {
    /// Subject as a user ID, if it is a UUID string
    pub fn subject(&self) -> Option<Uuid> {
        self.sub.as_ref()?.as_str()?.parse().ok()
    }

    /// Embedded role, if present and one of the known roles
    pub fn role(&self) -> Option<Role> {
        self.role.as_ref()?.as_str()?.parse().ok()
    }
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Token service for issuing and validating session tokens
///
/// Cheap to clone: keys and validation rules are shared.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Arc<Validation>,
    access_token_ttl: Duration,
}

impl TokenService {
    /// Create a token service with pre-computed keys
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(secret: &SigningSecret, access_token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Any HMAC variant is acceptable; every other family is rejected.
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            keys: JwtKeys::new(secret),
            validation: Arc::new(validation),
            access_token_ttl,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            &SigningSecret::new(config.secret.clone()),
            // Out-of-range lifetimes are refused at mint time
            Duration::try_seconds(config.access_token_expiry_secs).unwrap_or(Duration::MAX),
        )
    }

    /// Mint a pair using the configured access token lifetime
    #[inline]
    pub fn generate_token_pair(&self, user_id: Uuid, role: Role) -> Result<TokenPair, TokenError> {
        self.generate_token_pair_with_ttl(user_id, role, self.access_token_ttl)
    }

    /// Mint a pair with an explicit access token lifetime
    pub fn generate_token_pair_with_ttl(
        &self,
        user_id: Uuid,
        role: Role,
        access_ttl: Duration,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        let expires_at = |ttl: Duration| {
            now.checked_add_signed(ttl)
                .map(|at| at.timestamp())
                .ok_or_else(|| TokenError::Signing(format!("token lifetime out of range: {}s", ttl.num_seconds())))
        };

        let access = Claims {
            sub: user_id.to_string(),
            role: Some(role),
            exp: expires_at(access_ttl)?,
        };
        let refresh = Claims {
            sub: user_id.to_string(),
            role: None,
            exp: expires_at(Duration::seconds(REFRESH_TOKEN_TTL_SECS))?,
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Sign arbitrary claims with HS256
    pub(crate) fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, self.keys.encoding())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm family and expiry, then return the claims
    pub fn validate_and_extract(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, self.keys.decoding(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    #[inline]
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }
}
