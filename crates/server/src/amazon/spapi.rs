//! Selling Partner API client.
//!
//! Two kinds of calls are made:
//!
//! - **Seller-delegated**: the caller supplies an access token (e.g. the
//!   storefront forwarding one it obtained through the consent flow). Used by
//!   `get_orders`.
//! - **Application-initiated**: the client mints its own access token from
//!   the configured `REFRESH_TOKEN` and caches it until shortly before expiry.
//!   Used by reports and fee estimates.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::RequestBuilder;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use super::lwa::LwaClient;
use super::types::{
    ALL_ORDERS_REPORT, AccessToken, CreateReportRequest, CreateReportResponse, FeesEstimateBody,
    FeesEstimateRequest, FeesEstimateResponse, Money, PriceToEstimateFees, ProcessingStatus,
    Report, ReportDocument, ReportPoll,
};
use super::AmazonError;
use crate::config::SpApiConfig;

const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";
const USER_AGENT: &str = concat!("MarketplaceBridge/", env!("CARGO_PKG_VERSION"));

/// Client for the Selling Partner API.
#[derive(Clone)]
pub struct SpApiClient {
    inner: Arc<SpApiClientInner>,
}

struct SpApiClientInner {
    client: reqwest::Client,
    lwa: LwaClient,
    endpoint: String,
    marketplace_id: String,
    refresh_token: Option<SecretString>,
    /// Application access token minted from `refresh_token`
    token: RwLock<Option<AccessToken>>,
}

impl SpApiClient {
    /// Create a new SP-API client.
    #[must_use]
    pub fn new(config: &SpApiConfig, lwa: LwaClient, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(SpApiClientInner {
                client,
                lwa,
                endpoint: config.endpoint.clone(),
                marketplace_id: config.marketplace_id.clone(),
                refresh_token: config.refresh_token.clone(),
                token: RwLock::new(None),
            }),
        }
    }

    /// Marketplace used for reports and fee estimates.
    #[must_use]
    pub fn marketplace_id(&self) -> &str {
        &self.inner.marketplace_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────────

    /// List orders created after `created_after` using a caller-supplied token.
    ///
    /// The upstream JSON is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::Api` if SP-API rejects the request.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Value, AmazonError> {
        let created_after = created_after.to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = Url::parse_with_params(
            &self.url("/orders/v0/orders"),
            &[
                ("MarketplaceIds", self.inner.marketplace_id.as_str()),
                ("CreatedAfter", created_after.as_str()),
            ],
        )?;

        let request = self.inner.client.get(url);
        self.send(request, access_token).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    /// Request a report covering data from `data_start_time` onwards.
    ///
    /// Returns the report id.
    ///
    /// # Errors
    ///
    /// Returns an error if no application token can be obtained or SP-API
    /// rejects the request.
    #[instrument(skip(self))]
    pub async fn create_report(
        &self,
        report_type: &str,
        data_start_time: DateTime<Utc>,
    ) -> Result<String, AmazonError> {
        let body = CreateReportRequest {
            report_type,
            marketplace_ids: vec![self.inner.marketplace_id.as_str()],
            data_start_time: data_start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        let token = self.application_token().await?;
        let request = self
            .inner
            .client
            .post(self.url("/reports/2021-06-30/reports"))
            .json(&body);
        let created: CreateReportResponse = self.send(request, &token).await?;

        tracing::info!(report_id = %created.report_id, "report requested");
        Ok(created.report_id)
    }

    /// Get the current state of a report.
    ///
    /// # Errors
    ///
    /// Returns an error if no application token can be obtained or SP-API
    /// rejects the request.
    pub async fn get_report(&self, report_id: &str) -> Result<Report, AmazonError> {
        let token = self.application_token().await?;
        let path = format!(
            "/reports/2021-06-30/reports/{}",
            urlencoding::encode(report_id)
        );
        let request = self.inner.client.get(self.url(&path));
        self.send(request, &token).await
    }

    /// Poll a report until it reaches a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::ReportFailed` for `FATAL` or `CANCELLED`.
    /// Returns `AmazonError::ReportTimeout` if `poll.max_attempts` checks pass
    /// without a terminal status.
    #[instrument(skip(self, poll))]
    pub async fn wait_for_report(
        &self,
        report_id: &str,
        poll: ReportPoll,
    ) -> Result<Report, AmazonError> {
        for attempt in 1..=poll.max_attempts {
            let report = self.get_report(report_id).await?;
            match report.processing_status {
                ProcessingStatus::Done => return Ok(report),
                status @ (ProcessingStatus::Fatal | ProcessingStatus::Cancelled) => {
                    return Err(AmazonError::ReportFailed {
                        report_id: report_id.to_string(),
                        status,
                    });
                }
                status => {
                    tracing::info!(%status, attempt, "report still processing");
                }
            }
            tokio::time::sleep(poll.interval).await;
        }

        Err(AmazonError::ReportTimeout {
            report_id: report_id.to_string(),
            attempts: poll.max_attempts,
        })
    }

    /// Get the download location of a finished report.
    ///
    /// # Errors
    ///
    /// Returns an error if no application token can be obtained or SP-API
    /// rejects the request.
    pub async fn get_report_document(
        &self,
        document_id: &str,
    ) -> Result<ReportDocument, AmazonError> {
        let token = self.application_token().await?;
        let path = format!(
            "/reports/2021-06-30/documents/{}",
            urlencoding::encode(document_id)
        );
        let request = self.inner.client.get(self.url(&path));
        self.send(request, &token).await
    }

    /// Download a report document as text.
    ///
    /// The content is returned verbatim (tab-separated for flat-file reports).
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::UnsupportedCompression` for compressed documents.
    /// Returns `AmazonError::Api` if the download fails.
    pub async fn download_report(&self, document: &ReportDocument) -> Result<String, AmazonError> {
        if let Some(algorithm) = &document.compression_algorithm {
            return Err(AmazonError::UnsupportedCompression(algorithm.clone()));
        }

        let response = self.inner.client.get(&document.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmazonError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    /// Request, await and download the all-orders report since `since`.
    ///
    /// # Errors
    ///
    /// Returns any error from the individual report steps.
    pub async fn fetch_orders_report(
        &self,
        since: DateTime<Utc>,
        poll: ReportPoll,
    ) -> Result<String, AmazonError> {
        let report_id = self.create_report(ALL_ORDERS_REPORT, since).await?;
        let report = self.wait_for_report(&report_id, poll).await?;

        let Some(document_id) = report.report_document_id else {
            return Err(AmazonError::Api {
                status: 200,
                body: format!("report {report_id} is DONE but has no reportDocumentId"),
            });
        };

        let document = self.get_report_document(&document_id).await?;
        self.download_report(&document).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Product Fees
    // ─────────────────────────────────────────────────────────────────────────

    /// Estimate total marketplace fees for selling `asin` at `price`.
    ///
    /// Returns the `TotalFeesEstimate` amount, in the listing currency.
    ///
    /// # Errors
    ///
    /// Returns `AmazonError::FeesEstimate` if SP-API reports an estimation
    /// error, or any transport error.
    #[instrument(skip(self))]
    pub async fn get_fees_estimate(
        &self,
        asin: &str,
        price: Decimal,
        currency: &str,
        is_fba: bool,
    ) -> Result<Decimal, AmazonError> {
        let body = FeesEstimateBody {
            fees_estimate_request: FeesEstimateRequest {
                marketplace_id: &self.inner.marketplace_id,
                is_amazon_fulfilled: is_fba,
                price_to_estimate_fees: PriceToEstimateFees {
                    listing_price: Money {
                        currency_code: currency.to_string(),
                        amount: price,
                    },
                },
                identifier: format!("{asin}-{}", Utc::now().timestamp_millis()),
            },
        };

        let token = self.application_token().await?;
        let path = format!(
            "/products/fees/v0/items/{}/feesEstimate",
            urlencoding::encode(asin)
        );
        let request = self.inner.client.post(self.url(&path)).json(&body);
        let response: FeesEstimateResponse = self.send(request, &token).await?;

        let result = response.payload.fees_estimate_result;
        match (result.status.as_str(), result.fees_estimate, result.error) {
            ("Success", Some(estimate), _) => Ok(estimate.total_fees_estimate.amount),
            (_, _, Some(error)) => Err(AmazonError::FeesEstimate(format!(
                "{}: {}",
                error.code, error.message
            ))),
            (status, _, _) => Err(AmazonError::FeesEstimate(format!(
                "status {status} without an estimate"
            ))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request plumbing
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.endpoint)
    }

    /// Attach auth headers, send, and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access_token: &str,
    ) -> Result<T, AmazonError> {
        let response = request
            .header(ACCESS_TOKEN_HEADER, access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "SP-API request failed");
            return Err(AmazonError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Cached application access token, refreshed when within 60s of expiry.
    async fn application_token(&self) -> Result<String, AmazonError> {
        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let refresh_token = self
            .inner
            .refresh_token
            .as_ref()
            .ok_or(AmazonError::MissingRefreshToken)?;

        let mut guard = self.inner.token.write().await;
        if let Some(token) = guard.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self
            .inner
            .lwa
            .refresh_access_token(refresh_token.expose_secret())
            .await?;
        tracing::debug!(expires_in = fresh.expires_in, "minted SP-API access token");
        let access_token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(access_token)
    }
}
