//! Error types shared across crates

use thiserror::Error;

/// A role string outside the known set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct ParseRoleError(pub String);
