//! Authentication module
//!
//! Provides cookie-based JWT authentication with argon2 password hashing.

mod guards;
mod jwt;
mod middleware;
mod password;

pub use guards::{check_admin, check_identity, require_admin, require_identity};
pub use jwt::{
    JwtKeys, SigningSecret, TokenClaims, TokenError, TokenPair, TokenService,
    REFRESH_TOKEN_TTL_SECS,
};
pub use middleware::{
    authenticate, parse_cookie, resolve_identity, Identity, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
pub use password::PasswordService;
