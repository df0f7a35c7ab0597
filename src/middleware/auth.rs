use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::roles::{self, RoleSet};

/// Request-scoped principal context, populated once per request from
/// the verified token plus the stored user record, and passed to every
/// guard and handler. Role data is never re-derived downstream.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub principal_id: Uuid,
    pub name: String,
    pub roles: RoleSet,
    pub is_active: bool,
}

impl RequestContext {
    /// Route/feature guard: the principal must be active and satisfy
    /// the required-role list (empty list means any authenticated
    /// principal; the all-access role passes everything).
    pub fn require_roles(&self, required: &[&str]) -> Result<(), ApiError> {
        if !self.is_active {
            return Err(ApiError::forbidden("user account is inactive"));
        }
        if roles::has_capability(&self.roles, required) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "you do not have the role required for this resource",
            ))
        }
    }
}

/// Validates the bearer token, loads the user record behind it, and
/// injects a [`RequestContext`] into the request. Inactive or deleted
/// users are refused here, before any handler runs.
pub async fn principal_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_token(&token).map_err(ApiError::unauthorized)?;

    let user = state
        .service
        .get_user(claims.sub)
        .await
        .map_err(|_| ApiError::unauthorized("unknown user"))?;

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "rejected request from inactive user");
        return Err(ApiError::forbidden("user account is inactive"));
    }

    let context = RequestContext {
        principal_id: user.id,
        name: user.name.clone(),
        roles: user.role_set(),
        is_active: user.is_active,
    };
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate the token signature and extract claims
fn validate_token(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid bearer token: {}", e))?;

    Ok(token_data.claims)
}
