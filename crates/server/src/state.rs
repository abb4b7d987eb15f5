//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::amazon::{LwaClient, SpApiClient};
use crate::config::{BridgeConfig, CredentialBackend};
use crate::db::PgCredentialStore;
use crate::services::{CredentialStore, MemoryCredentialStore};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BridgeConfig,
    pool: PgPool,
    lwa: LwaClient,
    spapi: SpApiClient,
    credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Create a new application state, selecting the credential backend from
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(config: BridgeConfig, pool: PgPool) -> Result<Self, StateError> {
        let credentials: Arc<dyn CredentialStore> = match config.credential_backend {
            CredentialBackend::Postgres => Arc::new(PgCredentialStore::new(pool.clone())),
            CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
        };
        Self::with_credentials(config, pool, credentials)
    }

    /// Create a new application state with an explicit credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn with_credentials(
        config: BridgeConfig,
        pool: PgPool,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, StateError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let lwa = LwaClient::new(&config.lwa, client.clone());
        let spapi = SpApiClient::new(&config.spapi, lwa.clone(), client);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                lwa,
                spapi,
                credentials,
            }),
        })
    }

    /// Get a reference to the bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Login with Amazon client.
    #[must_use]
    pub fn lwa(&self) -> &LwaClient {
        &self.inner.lwa
    }

    /// Get a reference to the Selling Partner API client.
    #[must_use]
    pub fn spapi(&self) -> &SpApiClient {
        &self.inner.spapi
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.inner.credentials.as_ref()
    }
}
