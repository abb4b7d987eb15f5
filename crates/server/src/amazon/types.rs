//! Types for Login with Amazon tokens and Selling Partner API responses.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: i64 = 3600;

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Tokens issued for an authorization code.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// Short-lived access token for SP-API calls.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Access token obtained from a refresh-token grant.
#[derive(Clone)]
pub struct AccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// When the token was obtained.
    pub obtained_at: DateTime<Utc>,
}

impl AccessToken {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let expires_at = self.obtained_at + chrono::Duration::seconds(self.expires_in - 60);
        Utc::now() >= expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Raw body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports API (2021-06-30)
// ─────────────────────────────────────────────────────────────────────────────

/// Report type for all orders, flat file, by order date.
pub const ALL_ORDERS_REPORT: &str = "GET_FLAT_FILE_ALL_ORDERS_DATA_BY_ORDER_DATE_GENERAL";

/// Processing state of a report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    InQueue,
    InProgress,
    Done,
    Cancelled,
    Fatal,
}

impl ProcessingStatus {
    /// Whether polling can stop.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Fatal)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InQueue => "IN_QUEUE",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
            Self::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateReportRequest<'a> {
    pub report_type: &'a str,
    pub marketplace_ids: Vec<&'a str>,
    pub data_start_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateReportResponse {
    pub report_id: String,
}

/// A report request and its processing state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    #[serde(default)]
    pub report_type: Option<String>,
    pub processing_status: ProcessingStatus,
    /// Set once processing is `DONE`.
    #[serde(default)]
    pub report_document_id: Option<String>,
}

/// Download location for a finished report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_document_id: String,
    /// Pre-signed URL, valid for a few minutes.
    pub url: String,
    /// `GZIP` when the document is compressed.
    #[serde(default)]
    pub compression_algorithm: Option<String>,
}

/// Polling cadence for [`SpApiClient::wait_for_report`](super::SpApiClient::wait_for_report).
#[derive(Debug, Clone, Copy)]
pub struct ReportPoll {
    /// Delay between status checks.
    pub interval: std::time::Duration,
    /// Checks before giving up.
    pub max_attempts: u32,
}

impl Default for ReportPoll {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(2),
            max_attempts: 150,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Product Fees API (v0)
// ─────────────────────────────────────────────────────────────────────────────

/// Monetary amount in SP-API's `PascalCase` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Amount, sent and received as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimateBody<'a> {
    pub fees_estimate_request: FeesEstimateRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimateRequest<'a> {
    pub marketplace_id: &'a str,
    pub is_amazon_fulfilled: bool,
    pub price_to_estimate_fees: PriceToEstimateFees,
    pub identifier: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct PriceToEstimateFees {
    pub listing_price: Money,
}

#[derive(Debug, Deserialize)]
pub(super) struct FeesEstimateResponse {
    pub payload: FeesEstimatePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimatePayload {
    pub fees_estimate_result: FeesEstimateResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimateResult {
    pub status: String,
    #[serde(default)]
    pub fees_estimate: Option<FeesEstimate>,
    #[serde(default)]
    pub error: Option<FeesEstimateError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimate {
    pub total_fees_estimate: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct FeesEstimateError {
    pub code: String,
    pub message: String,
}
