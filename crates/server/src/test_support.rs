//! Helpers shared by unit tests: fake upstream servers and app state.

use std::net::SocketAddr;

use axum::Router;
use sqlx::postgres::PgPoolOptions;

use crate::config::BridgeConfig;
use crate::config::tests::test_config;
use crate::services::credentials::MemoryCredentialStore;
use crate::state::AppState;

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(clippy::expect_used)]
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Configuration with every upstream pointed at `upstream`.
pub fn config_for(upstream: &str) -> BridgeConfig {
    test_config(upstream)
}

/// App state backed by an in-memory credential store and a pool that never
/// connects unless a handler touches the database.
#[allow(clippy::expect_used)]
pub fn memory_state(config: BridgeConfig) -> (AppState, MemoryCredentialStore) {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://bridge@127.0.0.1:1/unreachable")
        .expect("lazy pool");
    let store = MemoryCredentialStore::new();
    let state = AppState::with_credentials(config, pool, std::sync::Arc::new(store.clone()))
        .expect("app state");
    (state, store)
}
