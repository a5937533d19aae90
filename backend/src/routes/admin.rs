//! Admin-only routes, mounted behind `require_admin`

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::state::AppState;
use account_service_shared::{AdminDashboard, DataResponse};
use axum::{routing::get, Json, Router};
use chrono::Utc;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin", get(dashboard))
}

/// GET /api/admin
async fn dashboard(identity: Identity) -> ApiResult<Json<DataResponse<AdminDashboard>>> {
    let body = AdminDashboard {
        admin_id: identity.id,
        role: identity.role,
        server_time: Utc::now(),
    };
    Ok(Json(DataResponse::success(body).with_message("Admin Dashboard")))
}
