//! Login with Amazon (LWA) OAuth client.
//!
//! # OAuth Flow
//!
//! 1. Build the consent URL with `authorization_url()`
//! 2. Redirect the seller to Seller Central
//! 3. Amazon redirects back with `spapi_oauth_code` and `selling_partner_id`
//! 4. Exchange the code for tokens with `exchange_code()`
//! 5. Later, mint access tokens from the refresh token with `refresh_access_token()`

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use super::AmazonError;
use super::types::{AccessToken, DEFAULT_EXPIRES_IN, TokenBundle, TokenResponse};
use crate::config::LwaConfig;

/// Client for the LWA consent and token endpoints.
#[derive(Clone)]
pub struct LwaClient {
    inner: Arc<LwaClientInner>,
}

struct LwaClientInner {
    client: reqwest::Client,
    app_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    profile_url: String,
}

impl LwaClient {
    /// Create a new LWA client sharing `client` for outbound requests.
    #[must_use]
    pub fn new(config: &LwaConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(LwaClientInner {
                client,
                app_id: config.app_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_uri: config.redirect_uri.clone(),
                auth_url: config.auth_url.clone(),
                token_url: config.token_url.clone(),
                profile_url: config.profile_url.clone(),
            }),
        }
    }

    /// Get the OAuth client ID.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.inner.app_id
    }

    /// Build the seller consent URL.
    ///
    /// # Arguments
    ///
    /// * `state` - Value echoed back on the callback
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let separator = if self.inner.auth_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{separator}application_id={}&state={}&redirect_uri={}",
            self.inner.auth_url,
            urlencoding::encode(&self.inner.app_id),
            urlencoding::encode(state),
            urlencoding::encode(&self.inner.redirect_uri)
        )
    }

    /// Exchange an authorization code for an access/refresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::TokenExchange` if the response carries no
    /// `access_token` or no `refresh_token`.
    /// Returns `AmazonError::Http` if the request cannot be sent.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenBundle, AmazonError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.inner.redirect_uri.as_str()),
            ("client_id", self.inner.app_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
        ];

        let (status, body, token) = self.request_token(&params).await?;
        let Some(refresh_token) = token.refresh_token else {
            return Err(AmazonError::TokenExchange { status, body });
        };

        Ok(TokenBundle {
            access_token: token.access_token,
            refresh_token,
            expires_in: token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        })
    }

    /// Exchange an authorization code when only the access token is needed.
    ///
    /// Unlike `exchange_code()`, a response without `refresh_token` is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::TokenExchange` if the response carries no
    /// `access_token`.
    #[instrument(skip_all)]
    pub async fn exchange_code_for_access_token(
        &self,
        code: &str,
    ) -> Result<AccessToken, AmazonError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.inner.redirect_uri.as_str()),
            ("client_id", self.inner.app_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
        ];

        let (_, _, token) = self.request_token(&params).await?;

        Ok(AccessToken {
            access_token: token.access_token,
            expires_in: token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            obtained_at: Utc::now(),
        })
    }

    /// Mint a fresh access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::TokenExchange` if the response carries no
    /// `access_token`.
    #[instrument(skip_all)]
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<AccessToken, AmazonError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.inner.app_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
        ];

        let (_, _, token) = self.request_token(&params).await?;

        Ok(AccessToken {
            access_token: token.access_token,
            expires_in: token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            obtained_at: Utc::now(),
        })
    }

    /// Fetch the LWA profile of the user who granted `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::Api` on a non-success status.
    #[instrument(skip_all)]
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Value, AmazonError> {
        let response = self
            .inner
            .client
            .get(&self.inner.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmazonError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// POST a form grant to the token endpoint.
    ///
    /// Success is decided by the presence of `access_token` in the body, not
    /// by the status code. Returns the status and raw body alongside the
    /// parsed token so callers can report further missing fields.
    async fn request_token(
        &self,
        params: &[(&str, &str)],
    ) -> Result<(u16, String, TokenResponse), AmazonError> {
        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        if !parsed.get("access_token").is_some_and(Value::is_string) {
            tracing::warn!(status, "token endpoint returned no access_token");
            return Err(AmazonError::TokenExchange { status, body });
        }

        let token: TokenResponse = match serde_json::from_value(parsed) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(status, error = %e, "token endpoint returned a malformed body");
                return Err(AmazonError::TokenExchange { status, body });
            }
        };
        Ok((status, body, token))
    }
}
