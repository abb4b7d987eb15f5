//! Selling Partner API pass-through handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::BearerToken;
use crate::state::AppState;

/// Window used when `created_after` is omitted.
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Query parameters of `GET /user/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct UserOrdersQuery {
    /// RFC 3339 timestamp or `YYYY-MM-DD` date.
    #[serde(default)]
    pub created_after: Option<String>,
}

/// Parse `created_after`, defaulting to 30 days ago.
fn created_after(raw: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(now - Duration::days(DEFAULT_LOOKBACK_DAYS));
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "created_after must be an RFC 3339 timestamp or YYYY-MM-DD (got '{raw}')"
            ))
        })
}

/// List the caller's SP-API orders using their own access token.
///
/// # Route
///
/// `GET /user/orders`
#[instrument(skip_all)]
pub async fn user_orders(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    query: std::result::Result<Query<UserOrdersQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let since = created_after(query.created_after.as_deref(), Utc::now())?;

    let orders = state.spapi().get_orders(&token, since).await?;
    Ok(Json(orders))
}
