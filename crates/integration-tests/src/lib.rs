//! Integration tests for Marketplace Bridge.
//!
//! # Running Tests
//!
//! ```bash
//! # Point DATABASE_URL at a disposable database, then
//! cargo test -p marketplace-bridge-integration-tests -- --ignored
//! ```
//!
//! Every test applies the migrations first and uses unique emails and order
//! ids, so the suite can run repeatedly against the same database.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use marketplace_bridge_server::config::{
    BridgeConfig, CredentialBackend, LwaConfig, OAuthFlowConfig, OAuthStateMode, SpApiConfig,
};
use marketplace_bridge_server::db::{MIGRATOR, PgCredentialStore};
use marketplace_bridge_server::routes;
use marketplace_bridge_server::state::AppState;
use secrecy::SecretString;
use sqlx::PgPool;
use tower_sessions::MemoryStore;

/// Connection string for the test database.
#[must_use]
pub fn database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/marketplace_bridge_test".to_string())
}

/// Connect to the test database and apply migrations.
pub async fn migrated_pool() -> PgPool {
    let pool = PgPool::connect(&database_url())
        .await
        .expect("Failed to connect to test database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}

/// A string unique to this test run, for emails and order ids.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Configuration for routing tests. Amazon endpoints point at a closed port.
#[must_use]
pub fn test_config() -> BridgeConfig {
    let upstream = "http://127.0.0.1:1";
    BridgeConfig {
        database_url: SecretString::from(database_url()),
        host: [127, 0, 0, 1].into(),
        port: 10000,
        session_secret: SecretString::from("kT9#mQ2$vX7!pL4@wR8^zN3&bH6*cJ1%"),
        lwa: LwaConfig {
            app_id: "amzn1.application-oa2-client.integration".to_string(),
            client_secret: SecretString::from("lwa-integration-client"),
            redirect_uri: "http://localhost:10000/callback".to_string(),
            auth_url: format!("{upstream}/apps/authorize/consent"),
            token_url: format!("{upstream}/auth/o2/token"),
            profile_url: format!("{upstream}/user/profile"),
        },
        spapi: SpApiConfig {
            endpoint: upstream.to_string(),
            marketplace_id: "A1AM78C64UM0Y8".to_string(),
            refresh_token: None,
        },
        oauth: OAuthFlowConfig {
            state: OAuthStateMode::Random,
            dashboard_url: "/dashboard".to_string(),
        },
        credential_backend: CredentialBackend::Postgres,
        http_timeout: Duration::from_secs(5),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full application router on top of `pool`.
#[must_use]
pub fn app(pool: PgPool) -> Router {
    let state = AppState::with_credentials(
        test_config(),
        pool.clone(),
        Arc::new(PgCredentialStore::new(pool)),
    )
    .expect("Failed to build app state");
    routes::app(state, MemoryStore::default())
}
