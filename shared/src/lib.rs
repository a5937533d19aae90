//! Account Service Shared Library
//!
//! This crate contains the wire types, role model, and validation helpers
//! used by the backend and by any Rust client of its HTTP API.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::Role;
pub use types::*;
