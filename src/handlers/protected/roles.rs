use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::RequestContext;
use crate::roles::{ID_ADMIN, SD_ADMIN};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequestBody {
    pub role: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    pub decision: crate::store::Decision,
    pub notes: Option<String>,
}

/// POST /api/roles/requests - submit a request for an additional role.
pub async fn request_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<CreateRoleRequestBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ctx.require_roles(&[])?;

    let request = state
        .service
        .create_role_request(ctx.principal_id, &body.role, body.notes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": request })),
    ))
}

/// GET /api/roles/requests - the principal's own requests, newest first.
pub async fn requests_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[])?;

    let requests = state
        .service
        .list_requests_for_user(ctx.principal_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": requests })))
}

/// POST /api/roles/requests/:id/resolve - approve or reject a pending
/// request. The route admits any dashboard admin (all-access bypasses);
/// the service enforces the precise per-domain authority and the
/// no-self-approval rule.
pub async fn resolve_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[SD_ADMIN, ID_ADMIN])?;

    let request = state
        .service
        .resolve_role_request(request_id, ctx.principal_id, body.decision, body.notes)
        .await?;

    Ok(Json(json!({ "success": true, "data": request })))
}
