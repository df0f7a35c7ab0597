use std::sync::Arc;

use anyhow::Result;

use rolegate::auth;
use rolegate::handlers::{app, AppState};
use rolegate::store::memory::MemoryStore;
use rolegate::store::{AccessStore, User};

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
}

/// Spawns the axum app in-process on an ephemeral port. Each test gets
/// its own store, so tests stay independent.
pub async fn spawn_app() -> Result<TestServer> {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.expect("test server");
    });

    Ok(TestServer { base_url, store })
}

/// Inserts a user directly into the store and mints a bearer token for
/// it, standing in for the external identity provider.
pub async fn seed_user(
    store: &MemoryStore,
    name: &str,
    email: &str,
    roles: &[&str],
    is_active: bool,
) -> Result<(User, String)> {
    let mut user = User::new(name, email, roles.iter().map(|r| r.to_string()).collect());
    user.is_active = is_active;
    let user = store.insert_user(user).await?;
    let token = auth::generate_token(user.id, &user.name)?;
    Ok((user, token))
}
