//! Authentication routes
//!
//! Provides endpoints for registration, login, token refresh and logout.
//! Tokens travel only in `HttpOnly` cookies, never in response bodies.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::{parse_cookie, TokenPair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_TTL_SECS};
use crate::config::CookieConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use account_service_shared::{DataResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    routing::post,
    Json, Router,
};
use validator::Validate;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
}

fn cookie_header(
    name: &str,
    value: &str,
    max_age_secs: i64,
    config: &CookieConfig,
) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        name, value, max_age_secs
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &config.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("invalid cookie header: {}", e)))
}

/// `Set-Cookie` headers carrying a freshly minted pair
fn session_cookies(state: &AppState, pair: &TokenPair) -> Result<HeaderMap, ApiError> {
    let config = &state.config().cookie;
    let access_max_age = state.tokens().access_token_ttl().num_seconds();

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        cookie_header(ACCESS_TOKEN_COOKIE, &pair.access_token, access_max_age, config)?,
    );
    headers.append(
        SET_COOKIE,
        cookie_header(REFRESH_TOKEN_COOKIE, &pair.refresh_token, REFRESH_TOKEN_TTL_SECS, config)?,
    );
    Ok(headers)
}

/// Register a new user
///
/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .auth()
        .register(&req.name, &req.email, &req.password, req.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::success(user).with_message("User registered successfully")),
    ))
}

/// Login with email and password
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let pair = state.auth().login(&req.email, &req.password).await?;

    Ok((
        session_cookies(&state, &pair)?,
        Json(MessageResponse::success("Login successful")),
    ))
}

/// Exchange the `refresh_token` cookie for a new pair
///
/// POST /auth/refresh
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let token = parse_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token not found".to_string()))?;

    let pair = state.auth().refresh_token(&token).await?;

    Ok((
        session_cookies(&state, &pair)?,
        Json(MessageResponse::success("Tokens refreshed successfully")),
    ))
}

/// Expire both session cookies
///
/// POST /auth/logout
///
/// Tokens are stateless, so anything already copied stays valid until expiry.
async fn logout(State(state): State<AppState>) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let config = &state.config().cookie;

    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, cookie_header(ACCESS_TOKEN_COOKIE, "", 0, config)?);
    headers.append(SET_COOKIE, cookie_header(REFRESH_TOKEN_COOKIE, "", 0, config)?);

    Ok((headers, Json(MessageResponse::success("Logged out"))))
}
