//! Seller consent (Login with Amazon) route handlers.
//!
//! - Start: redirects the seller to the Seller Central consent page
//! - Callback: exchanges the code, stores the tokens, redirects to the dashboard
//! - Dashboard: serves the stored tokens for a selling partner
//! - Frontend exchange: trades a code for a token and profile without storing

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_bridge_core::SellingPartnerId;

use crate::db::RepositoryError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::{CallbackParams, OAuthService, TokenRecord};
use crate::state::AppState;

/// Query parameters of `GET /dashboard`.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub selling_partner_id: Option<String>,
}

/// Stored tokens as served by `GET /dashboard`.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub selling_partner_id: SellingPartnerId,
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenRecord> for DashboardView {
    fn from(record: TokenRecord) -> Self {
        Self {
            expires_in: record.expires_in(),
            selling_partner_id: record.selling_partner_id,
            access_token: record.access_token,
            refresh_token: record.refresh_token,
            expires_at: record.expires_at,
        }
    }
}

/// Body of `POST /auth/amazon`.
#[derive(Debug, Default, Deserialize)]
pub struct AmazonAuthRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// Response of `POST /auth/amazon`.
#[derive(Debug, Serialize)]
pub struct AmazonAuthResponse {
    pub access_token: String,
    pub user: Value,
}

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn oauth_service(state: &AppState) -> OAuthService<'_> {
    OAuthService::new(state.lwa(), state.credentials(), &state.config().oauth)
}

/// Redirect the seller to the consent page.
///
/// In random-state mode the generated state is stored in the session for
/// the callback to check.
///
/// # Route
///
/// `GET /start-oauth`
#[instrument(skip_all)]
pub async fn start_oauth(State(state): State<AppState>, session: Session) -> Result<Response> {
    let redirect = oauth_service(&state).initiate();

    if let Some(oauth_state) = &redirect.session_state {
        session
            .insert(session_keys::OAUTH_STATE, oauth_state)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;
    }

    add_breadcrumb("oauth", "Redirected to consent page", None);
    Ok(found(&redirect.url))
}

/// Handle the consent callback.
///
/// # Route
///
/// `GET /callback?spapi_oauth_code=&selling_partner_id=&state=`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query?;

    // One-time use: the stored state is removed whatever the outcome
    let session_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read OAuth state: {e}")))?;

    let outcome = oauth_service(&state)
        .handle_callback(params, session_state.as_deref())
        .await?;

    add_breadcrumb(
        "oauth",
        "Seller authorized",
        Some(&[("selling_partner_id", outcome.record.selling_partner_id.as_str())]),
    );
    Ok(found(&outcome.redirect_url))
}

/// Serve the stored tokens for a selling partner.
///
/// # Route
///
/// `GET /dashboard?selling_partner_id=`
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    query: std::result::Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardView>> {
    let Query(query) = query?;
    let Some(partner) = query.selling_partner_id.filter(|s| !s.trim().is_empty()) else {
        return Err(AppError::BadRequest("Missing selling_partner_id".to_string()));
    };
    let partner =
        SellingPartnerId::parse(&partner).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = state
        .credentials()
        .load_tokens(&partner)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::Unauthorized("Not authenticated".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(record.into()))
}

/// Exchange a code obtained by the frontend and return the user's profile.
///
/// Nothing is stored: without a selling partner id there is no key.
///
/// # Route
///
/// `POST /auth/amazon`
#[instrument(skip_all)]
pub async fn auth_amazon(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AmazonAuthRequest>, JsonRejection>,
) -> Result<Json<AmazonAuthResponse>> {
    let Json(request) = payload?;
    let Some(code) = request.code.filter(|c| !c.trim().is_empty()) else {
        return Err(AppError::BadRequest(
            "Authorization code is required".to_string(),
        ));
    };

    let token = state.lwa().exchange_code_for_access_token(code.trim()).await?;
    let user = state.lwa().fetch_profile(&token.access_token).await?;

    Ok(Json(AmazonAuthResponse {
        access_token: token.access_token,
        user,
    }))
}
