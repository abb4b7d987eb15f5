//! Orders report command.
//!
//! ```bash
//! mb-cli report orders --since 2025-01-01
//! ```
//!
//! Requests a `GET_FLAT_FILE_ALL_ORDERS_DATA_BY_ORDER_DATE_GENERAL` report,
//! polls until it is done and prints the raw document to stdout. Needs
//! `REFRESH_TOKEN` and the LWA application credentials.

use chrono::NaiveDate;
use marketplace_bridge_server::amazon::ReportPoll;

use super::{CommandError, spapi_client};

/// Parse a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_since(value: &str) -> Result<chrono::DateTime<chrono::Utc>, CommandError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CommandError::InvalidArgument(format!("--since must be YYYY-MM-DD, got {value}")))
}

/// Fetch the orders report created since `since` and print it.
pub async fn orders(since: &str) -> Result<(), CommandError> {
    let since = parse_since(since)?;
    let client = spapi_client()?;

    tracing::info!(%since, marketplace_id = client.marketplace_id(), "requesting orders report");
    let report = client.fetch_orders_report(since, ReportPoll::default()).await?;
    tracing::info!(bytes = report.len(), "report downloaded");

    #[allow(clippy::print_stdout)]
    {
        println!("{report}");
    }
    Ok(())
}
