//! User repository for database operations
//!
//! Deletes are soft: a row with `deleted_at` set is invisible to every
//! lookup and frees its email for reuse.

use crate::db;
use crate::repositories::RepositoryError;
use account_service_shared::{Role, UserResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// User record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Public projection without the password hash
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Generated when absent
    pub id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

/// Credential store contract
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `ConstraintViolation` if the email is taken
    async fn create(&self, user: NewUser) -> Result<UserRecord, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, RepositoryError>;

    /// Persist the full state of a previously fetched user (last write wins)
    async fn update(&self, user: &UserRecord) -> Result<UserRecord, RepositoryError>;

    /// Soft-delete; `NotFound` if there is no live user with this id
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Cheap liveness probe for readiness checks
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserRecord, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, password_hash, name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, role, created_at, updated_at, deleted_at
            "#,
        )
        .bind(user.id.unwrap_or_else(Uuid::new_v4))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, name, role, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, password_hash, name, role, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, user: &UserRecord) -> Result<UserRecord, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                name = $4,
                role = $5,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, email, password_hash, name, role, created_at, updated_at, deleted_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        db::health_check(&self.pool).await
    }
}
