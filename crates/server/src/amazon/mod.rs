//! Login with Amazon and Selling Partner API clients.
//!
//! # APIs
//!
//! ## Login with Amazon (LWA)
//! - Seller consent URL
//! - Authorization code and refresh token grants
//! - Profile of the authorizing user
//!
//! ## Selling Partner API
//! - Orders pass-through with a caller-supplied access token
//! - Report creation, polling and download
//! - Product fee estimates
//!
//! Both clients share one `reqwest::Client` so the configured timeout applies
//! to every outbound call. Nothing is retried.

mod lwa;
mod spapi;
pub mod types;

pub use lwa::LwaClient;
pub use spapi::SpApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to Amazon.
#[derive(Debug, Error)]
pub enum AmazonError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The token endpoint did not issue an access token.
    #[error("token exchange failed ({status}): {body}")]
    TokenExchange {
        /// Upstream HTTP status code.
        status: u16,
        /// Upstream response body, passed through verbatim.
        body: String,
    },

    /// An API call returned a non-success status.
    #[error("request failed ({status}): {body}")]
    Api {
        /// Upstream HTTP status code.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// Application-initiated calls need `REFRESH_TOKEN`.
    #[error("REFRESH_TOKEN is not configured")]
    MissingRefreshToken,

    /// Report processing ended in `FATAL` or `CANCELLED`.
    #[error("report {report_id} failed with status {status}")]
    ReportFailed {
        report_id: String,
        status: ProcessingStatus,
    },

    /// Report did not finish within the polling budget.
    #[error("report {report_id} still processing after {attempts} checks")]
    ReportTimeout { report_id: String, attempts: u32 },

    /// Report document is compressed with an algorithm we do not decode.
    #[error("unsupported report compression: {0}")]
    UnsupportedCompression(String),

    /// Fee estimate came back with an error status.
    #[error("fee estimate failed: {0}")]
    FeesEstimate(String),
}

impl AmazonError {
    /// Whether the token endpoint rejected the grant.
    #[must_use]
    pub const fn is_exchange_rejection(&self) -> bool {
        matches!(self, Self::TokenExchange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_exchange_display_passes_body_through() {
        let err = AmazonError::TokenExchange {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"token exchange failed (400): {"error":"invalid_grant"}"#
        );
        assert!(err.is_exchange_rejection());
    }

    #[test]
    fn test_report_failed_display() {
        let err = AmazonError::ReportFailed {
            report_id: "50039018".to_string(),
            status: ProcessingStatus::Fatal,
        };
        assert_eq!(err.to_string(), "report 50039018 failed with status FATAL");
        assert!(!err.is_exchange_rejection());
    }
}
