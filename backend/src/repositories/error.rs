//! Repository error types

use thiserror::Error;

/// Errors surfaced by user storage
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// Unique constraint hit (the only one on `users` is the live-email index)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation(
                    db_err
                        .constraint()
                        .unwrap_or_else(|| db_err.message())
                        .to_string(),
                )
            }
            other => RepositoryError::Storage(other.to_string()),
        }
    }
}
