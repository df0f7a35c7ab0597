use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::services::role_service::RegisterUser;

/// POST /auth/register - create a user account with the baseline role.
///
/// Email is the uniqueness key (409 on duplicates). Elevated roles are
/// never granted here; they go through the role-request workflow.
pub async fn register_post(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.service.register_user(input).await?;
    let roles = user.role_set();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "user": user,
                "roles": roles,
            }
        })),
    ))
}
