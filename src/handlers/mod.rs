use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::principal_middleware;
use crate::services::RoleService;
use crate::store::AccessStore;

pub mod protected;
pub mod public;

#[derive(Clone)]
pub struct AppState {
    pub service: RoleService,
}

impl AppState {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self {
            service: RoleService::new(store),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(public::auth::register_post))
        // Protected API behind the principal middleware
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{admin, auth, roles};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        // Role request workflow
        .route(
            "/api/roles/requests",
            get(roles::requests_get).post(roles::request_post),
        )
        .route("/api/roles/requests/:id/resolve", post(roles::resolve_post))
        // Admin surface
        .route("/api/admin/users", get(admin::users_get))
        .route("/api/admin/users/:id/roles", put(admin::user_roles_put))
        .route("/api/admin/requests", get(admin::requests_get))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            principal_middleware,
        ))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Rolegate",
            "version": version,
            "description": "RBAC and role-request workflow service for the reporting dashboards",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "register": "/auth/register (public)",
                "whoami": "/api/auth/whoami (protected)",
                "role_requests": "/api/roles/requests[/:id/resolve] (protected)",
                "admin": "/api/admin/* (protected, admin roles)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
