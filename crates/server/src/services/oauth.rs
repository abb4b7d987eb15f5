//! Seller consent flow.
//!
//! 1. `initiate()` produces the consent URL and, in random-state mode, the
//!    state value the caller must keep in the session.
//! 2. `handle_callback()` checks the callback parameters and the state,
//!    exchanges the code, persists the tokens and returns the dashboard
//!    redirect.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use thiserror::Error;

use marketplace_bridge_core::{SellingPartnerId, SellingPartnerIdError};

use crate::amazon::{AmazonError, LwaClient};
use crate::config::{OAuthFlowConfig, OAuthStateMode};
use crate::db::RepositoryError;
use crate::services::credentials::{CredentialStore, TokenRecord};

/// Length of generated `state` values.
pub const STATE_LENGTH: usize = 32;

/// Errors from the consent flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// `spapi_oauth_code` or `selling_partner_id` is missing or blank.
    #[error("Missing spapi_oauth_code or selling_partner_id")]
    MissingParameters,

    /// `selling_partner_id` is malformed.
    #[error("invalid selling_partner_id: {0}")]
    InvalidPartnerId(#[from] SellingPartnerIdError),

    /// `state` does not match the expected value.
    #[error("Invalid OAuth state")]
    StateMismatch,

    /// The token endpoint rejected the code, or could not be reached.
    #[error(transparent)]
    Exchange(#[from] AmazonError),

    /// Tokens could not be stored.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Query parameters of the consent callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub spapi_oauth_code: Option<String>,
    #[serde(default)]
    pub selling_partner_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Start of a consent flow.
#[derive(Debug)]
pub struct ConsentRedirect {
    /// Seller Central consent URL.
    pub url: String,
    /// Value to keep in the session, in random-state mode.
    pub session_state: Option<String>,
}

/// Result of a successful callback.
#[derive(Debug)]
pub struct CallbackOutcome {
    /// The stored tokens.
    pub record: TokenRecord,
    /// `{DASHBOARD_URL}?selling_partner_id=...`
    pub redirect_url: String,
}

/// Consent flow orchestration over the LWA client and a credential store.
pub struct OAuthService<'a> {
    lwa: &'a LwaClient,
    credentials: &'a dyn CredentialStore,
    flow: &'a OAuthFlowConfig,
}

impl<'a> OAuthService<'a> {
    #[must_use]
    pub const fn new(
        lwa: &'a LwaClient,
        credentials: &'a dyn CredentialStore,
        flow: &'a OAuthFlowConfig,
    ) -> Self {
        Self {
            lwa,
            credentials,
            flow,
        }
    }

    /// Build the consent redirect.
    #[must_use]
    pub fn initiate(&self) -> ConsentRedirect {
        match &self.flow.state {
            OAuthStateMode::Static(state) => ConsentRedirect {
                url: self.lwa.authorization_url(state),
                session_state: None,
            },
            OAuthStateMode::Random => {
                let state = generate_state();
                ConsentRedirect {
                    url: self.lwa.authorization_url(&state),
                    session_state: Some(state),
                }
            }
        }
    }

    /// Complete a consent flow.
    ///
    /// `session_state` is the value stored by `initiate()`, already removed
    /// from the session by the caller.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::MissingParameters` or `InvalidPartnerId` for bad
    /// parameters, `StateMismatch` if the state check fails, `Exchange` if no
    /// tokens are issued (nothing is stored in that case) and `Storage` if
    /// saving fails.
    pub async fn handle_callback(
        &self,
        params: CallbackParams,
        session_state: Option<&str>,
    ) -> Result<CallbackOutcome, OAuthError> {
        let (Some(code), Some(partner)) = (
            params.spapi_oauth_code.filter(|s| !s.trim().is_empty()),
            params.selling_partner_id.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(OAuthError::MissingParameters);
        };
        let partner = SellingPartnerId::parse(&partner)?;

        verify_state(&self.flow.state, params.state.as_deref(), session_state)?;

        let tokens = self.lwa.exchange_code(code.trim()).await?;
        let record = self.credentials.save_tokens(&partner, &tokens).await?;

        tracing::info!(
            selling_partner_id = %partner,
            backend = self.credentials.backend(),
            "seller authorized"
        );

        Ok(CallbackOutcome {
            redirect_url: dashboard_redirect(&self.flow.dashboard_url, &partner),
            record,
        })
    }
}

/// Check the callback `state` against the configured mode.
///
/// Random mode requires the callback value to equal the session value. Static
/// mode only rejects a supplied value that differs from the configured one.
///
/// # Errors
///
/// Returns `OAuthError::StateMismatch` if the check fails.
pub fn verify_state(
    mode: &OAuthStateMode,
    supplied: Option<&str>,
    session_state: Option<&str>,
) -> Result<(), OAuthError> {
    let ok = match mode {
        OAuthStateMode::Random => supplied.is_some() && supplied == session_state,
        OAuthStateMode::Static(expected) => supplied.is_none_or(|s| s == expected),
    };
    if ok {
        Ok(())
    } else {
        tracing::warn!("OAuth state mismatch");
        Err(OAuthError::StateMismatch)
    }
}

/// Dashboard URL carrying the partner id.
#[must_use]
pub fn dashboard_redirect(dashboard_url: &str, partner: &SellingPartnerId) -> String {
    let separator = if dashboard_url.contains('?') { '&' } else { '?' };
    format!(
        "{dashboard_url}{separator}selling_partner_id={}",
        urlencoding::encode(partner.as_str())
    )
}

/// Generate a random alphanumeric `state`.
fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
