//! User profile routes
//!
//! Every route here sits behind `require_identity`. Callers may act on
//! their own account; admins may act on any account and are the only ones
//! allowed to change a role.

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::services::UserPatch;
use crate::state::AppState;
use account_service_shared::{DataResponse, MessageResponse, UpdateUserRequest, UserResponse};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_current_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
}

fn authorize_target(identity: &Identity, target: Uuid) -> Result<(), ApiError> {
    if identity.id == target || identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Cannot modify another user".to_string()))
    }
}

/// Profile of the authenticated caller
///
/// GET /api/users
async fn get_current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<DataResponse<UserResponse>>> {
    let user = state.auth().get_user_by_id(identity.id).await?;
    Ok(Json(DataResponse::success(user)))
}

/// Partial update
///
/// PATCH /api/users/:id
async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<UserResponse>>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    req.validate()?;

    authorize_target(&identity, id)?;
    if req.role.is_some() && !identity.is_admin() {
        return Err(ApiError::Forbidden("Only admins can change roles".to_string()));
    }

    let user = state.auth().update_user(id, UserPatch::from(req)).await?;
    Ok(Json(DataResponse::success(user).with_message("User updated successfully")))
}

/// Soft delete
///
/// DELETE /api/users/:id
async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    authorize_target(&identity, id)?;

    state.auth().delete_user(id).await?;
    Ok(Json(MessageResponse::success("User deleted successfully")))
}
