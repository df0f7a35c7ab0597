use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::RequestContext;

/// GET /api/auth/whoami - current principal, resolved role set, and the
/// advisory list of roles still open to a request.
pub async fn whoami_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_roles(&[])?;

    let user = state.service.get_user(ctx.principal_id).await?;
    let requestable = state.service.requestable_roles(ctx.principal_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": user,
            "roles": ctx.roles,
            "requestable_roles": requestable,
        }
    })))
}
