//! Route guards
//!
//! Attach with `route_layer(middleware::from_fn(..))` after the
//! authenticator has had a chance to populate `Identity`.

use crate::auth::Identity;
use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};

pub fn check_identity(identity: Option<&Identity>) -> Result<Identity, ApiError> {
    identity
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

pub fn check_admin(identity: Option<&Identity>) -> Result<Identity, ApiError> {
    match check_identity(identity)? {
        identity if identity.is_admin() => Ok(identity),
        _ => Err(ApiError::Forbidden("Admin access required".to_string())),
    }
}

pub async fn require_identity(request: Request, next: Next) -> Result<Response, ApiError> {
    check_identity(request.extensions().get::<Identity>())?;
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    check_admin(request.extensions().get::<Identity>())?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_service_shared::Role;
    use rstest::rstest;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity { id: Uuid::new_v4(), role }
    }

    #[test]
    fn test_check_identity_requires_identity() {
        assert!(matches!(check_identity(None), Err(ApiError::Unauthorized(_))));

        let who = identity(Role::Guest);
        assert_eq!(check_identity(Some(&who)).unwrap(), who);
    }

    #[test]
    fn test_check_admin_without_identity_is_unauthorized() {
        assert!(matches!(check_admin(None), Err(ApiError::Unauthorized(_))));
    }

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Guest)]
    fn test_check_admin_rejects_non_admin(#[case] role: Role) {
        assert!(matches!(
            check_admin(Some(&identity(role))),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_check_admin_admits_admin() {
        let admin = identity(Role::Admin);
        assert_eq!(check_admin(Some(&admin)).unwrap(), admin);
    }
}
