use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::RequestContext;
use crate::roles::{ALL_ACCESS_ROLE, ID_ADMIN, SD_ADMIN};
use crate::store::RequestStatus;

#[derive(Debug, Deserialize)]
pub struct RequestsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceRolesBody {
    pub roles: Vec<String>,
}

/// GET /api/admin/users - all users. All-access only, matching the
/// admin panel this backs.
pub async fn users_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[ALL_ACCESS_ROLE])?;

    let users = state.service.list_users().await?;
    Ok(Json(json!({ "success": true, "data": users })))
}

/// GET /api/admin/requests?status= - role requests across all users,
/// optionally filtered by lifecycle state.
pub async fn requests_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<RequestsQuery>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[SD_ADMIN, ID_ADMIN])?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<RequestStatus>().map_err(|_| {
            ApiError::bad_request("status must be one of: pending, approved, rejected")
        })?),
    };

    let requests = state.service.list_requests(status).await?;
    Ok(Json(json!({ "success": true, "data": requests })))
}

/// PUT /api/admin/users/:id/roles - replace a user's role set
/// wholesale. All-access only; separate from the request workflow.
pub async fn user_roles_put(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ReplaceRolesBody>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[ALL_ACCESS_ROLE])?;

    let user = state
        .service
        .bulk_replace_roles(user_id, body.roles, ctx.principal_id)
        .await?;
    let roles = user.role_set();

    Ok(Json(json!({
        "success": true,
        "data": { "user": user, "roles": roles }
    })))
}
