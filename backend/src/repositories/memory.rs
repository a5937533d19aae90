//! In-memory user repository
//!
//! Mirrors the PostgreSQL semantics (live-email uniqueness, soft delete) so
//! the service and router can be exercised without a database.

use crate::repositories::{NewUser, RepositoryError, UserRecord, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

const EMAIL_CONSTRAINT: &str = "users_email_live_key";

/// Thread-safe in-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, including soft-deleted ones, ordered by creation
    pub fn snapshot(&self) -> Vec<UserRecord> {
        let mut rows: Vec<UserRecord> = self
            .users
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, UserRecord>>, RepositoryError> {
        self.users
            .read()
            .map_err(|_| RepositoryError::Storage("user store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, UserRecord>>, RepositoryError> {
        self.users
            .write()
            .map_err(|_| RepositoryError::Storage("user store lock poisoned".to_string()))
    }
}

fn email_in_use(map: &HashMap<Uuid, UserRecord>, email: &str, except: Option<Uuid>) -> bool {
    map.values()
        .any(|u| u.deleted_at.is_none() && u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<UserRecord, RepositoryError> {
        let mut map = self.write()?;
        if email_in_use(&map, &user.email, None) {
            return Err(RepositoryError::ConstraintViolation(EMAIL_CONSTRAINT.to_string()));
        }

        let id = user.id.unwrap_or_else(Uuid::new_v4);
        if map.contains_key(&id) {
            return Err(RepositoryError::ConstraintViolation("users_pkey".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        map.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, RepositoryError> {
        self.read()?
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, RepositoryError> {
        self.read()?
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, user: &UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut map = self.write()?;
        if email_in_use(&map, &user.email, Some(user.id)) {
            return Err(RepositoryError::ConstraintViolation(EMAIL_CONSTRAINT.to_string()));
        }

        let stored = map
            .get_mut(&user.id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(RepositoryError::NotFound)?;

        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.name = user.name.clone();
        stored.role = user.role;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut map = self.write()?;
        let stored = map
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        stored.deleted_at = Some(now);
        stored.updated_at = now;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }
}
