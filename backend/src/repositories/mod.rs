//! Database repositories
//!
//! Provides the credential store contract and its implementations.

pub mod error;
pub mod memory;
pub mod user;

pub use error::RepositoryError;
pub use memory::InMemoryUserRepository;
pub use user::{NewUser, PgUserRepository, UserRecord, UserRepository};
