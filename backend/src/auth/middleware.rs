//! Request authenticator
//!
//! Soft authentication: a request without a usable `access_token` cookie
//! passes through with no identity, and the route guards decide whether
//! that is acceptable. Only a correctly signed token with a malformed
//! payload is rejected outright.
//!
//! # Performance
//!
//! Uses pre-computed JWT keys from AppState to avoid expensive
//! key derivation on every request.

use crate::auth::TokenService;
use crate::error::{ApiError, AuthError};
use crate::state::AppState;
use account_service_shared::Role;
use axum::{
    extract::{Request, State},
    http::{header::COOKIE, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Verified caller identity, stored in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Find a cookie value by name across all `Cookie` headers
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| unquote(value.trim()).to_string())
}

/// RFC 6265 allows a cookie value wrapped in one pair of double quotes
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Resolve the caller from the `access_token` cookie
///
/// `Ok(None)` when there is no cookie or the token does not verify;
/// `Err` when the token verifies but its subject or role is unusable.
pub fn resolve_identity(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<Option<Identity>, ApiError> {
    let Some(token) = parse_cookie(headers, ACCESS_TOKEN_COOKIE) else {
        return Ok(None);
    };

    let claims = match tokens.validate_and_extract(&token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Ignoring unverifiable access token");
            return Ok(None);
        }
    };

    let id = claims.subject().ok_or(AuthError::InvalidToken)?;
    let role = claims.role().ok_or(AuthError::InvalidToken)?;

    Ok(Some(Identity { id, role }))
}

/// Middleware attaching `Identity` to the request when one can be resolved
///
/// Apply with `axum::middleware::from_fn_with_state`.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(identity) = resolve_identity(state.tokens(), request.headers())? {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

/// Handlers taking `Identity` get 401 when the authenticator found none
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
