use std::sync::Arc;

use rolegate::config;
use rolegate::handlers::{app, AppState};
use rolegate::store::memory::MemoryStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SECURITY_JWT_SECRET etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Rolegate in {:?} mode", config.environment);

    let state = AppState::new(Arc::new(MemoryStore::new()));

    // A fresh store needs one all-access admin before anyone can
    // approve requests or manage users.
    match state
        .service
        .ensure_bootstrap_admin(&config.bootstrap.admin_name, &config.bootstrap.admin_email)
        .await
    {
        Ok(Some(admin)) => tracing::info!(email = %admin.email, "bootstrap admin created"),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("failed to seed bootstrap admin: {}", e);
            std::process::exit(1);
        }
    }

    // Allow tests or deployments to override port via env
    let port = std::env::var("ROLEGATE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Rolegate listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.expect("server");
}
