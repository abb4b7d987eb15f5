//! `mb-cli` subcommands.

pub mod fees;
pub mod migrate;
pub mod report;

use marketplace_bridge_server::amazon::{AmazonError, LwaClient, SpApiClient};
use marketplace_bridge_server::config::{BridgeConfig, ConfigError};
use thiserror::Error;

/// Errors from the Selling Partner API commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Amazon(#[from] AmazonError),
}

/// Build an SP-API client from the server's environment configuration.
fn spapi_client() -> Result<SpApiClient, CommandError> {
    let config = BridgeConfig::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let lwa = LwaClient::new(&config.lwa, client.clone());
    Ok(SpApiClient::new(&config.spapi, lwa, client))
}
