//! Liveness, readiness and diagnostic handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::db;
use crate::error::Result;
use crate::state::AppState;

/// Banner served at `/`.
pub const BANNER: &str = "Marketplace bridge is running.";

/// Response of `GET /db-test`.
#[derive(Debug, Serialize)]
pub struct DbTestResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// `GET /`
pub async fn root() -> &'static str {
    BANNER
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Check the database connection and report in JSON.
///
/// # Route
///
/// `GET /db-test`
pub async fn db_test(State(state): State<AppState>) -> Result<Json<DbTestResponse>> {
    db::ping(state.pool()).await?;
    Ok(Json(DbTestResponse {
        status: "success",
        message: "Database connection successful",
    }))
}
