//! Application error handling
//!
//! `AuthError` is what the auth service reports; `ApiError` is what the
//! HTTP layer renders. Internal failures are logged here and reach the
//! client only as a generic message.

use crate::auth::TokenError;
use crate::repositories::RepositoryError;
use account_service_shared::{ErrorDetail, ErrorResponse};
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Auth service error taxonomy
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    /// Unknown email and wrong password share this variant and message
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("user not found")]
    UserNotFound,

    #[error("storage error: {0}")]
    Storage(#[source] RepositoryError),

    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AuthError::UserNotFound,
            RepositoryError::ConstraintViolation(_) => AuthError::EmailTaken,
            other => AuthError::Storage(other),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AuthError::Signing(msg),
            TokenError::Invalid(_) => AuthError::InvalidToken,
        }
    }
}

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".to_string()),
            AuthError::EmailTaken => ApiError::Conflict("Email already registered".to_string()),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Invalid refresh token".to_string())
            }
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            internal @ (AuthError::Storage(_) | AuthError::Hashing(_) | AuthError::Signing(_)) => {
                ApiError::Internal(anyhow::Error::new(internal))
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status() {
        let error = ApiError::NotFound("User not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_error_status() {
        let error = ApiError::Unauthorized("Invalid token".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(AuthError::Validation("name is required".into()), StatusCode::BAD_REQUEST)]
    #[case(AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED)]
    #[case(AuthError::EmailTaken, StatusCode::CONFLICT)]
    #[case(AuthError::InvalidToken, StatusCode::UNAUTHORIZED)]
    #[case(AuthError::InvalidRefreshToken, StatusCode::UNAUTHORIZED)]
    #[case(AuthError::UserNotFound, StatusCode::NOT_FOUND)]
    #[case(AuthError::Hashing("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AuthError::Signing("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(
        AuthError::Storage(RepositoryError::Storage("connection reset".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_auth_error_status_mapping(#[case] err: AuthError, #[case] expected: StatusCode) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), expected);
    }

    #[test]
    fn test_repository_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(RepositoryError::NotFound),
            AuthError::UserNotFound
        ));
        assert!(matches!(
            AuthError::from(RepositoryError::ConstraintViolation("users_email_key".into())),
            AuthError::EmailTaken
        ));
        assert!(matches!(
            AuthError::from(RepositoryError::Storage("timeout".into())),
            AuthError::Storage(_)
        ));
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = ApiError::from(AuthError::Hashing("argon2 exploded".into())).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("argon2"));
        assert!(text.contains("INTERNAL_ERROR"));
    }
}
