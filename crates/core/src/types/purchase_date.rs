//! Order purchase timestamps with a fixed wire format.
//!
//! Orders arrive from the storefront as `2025-01-04T10:00:00Z` and must be
//! returned in exactly the same shape, so parsing and formatting both go
//! through [`PURCHASE_DATE_FORMAT`] rather than RFC 3339 (which would accept
//! offsets and fractional seconds).

use core::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `strftime` pattern for purchase dates (UTC, second precision, `Z` suffix).
pub const PURCHASE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Error returned when a purchase date does not match [`PURCHASE_DATE_FORMAT`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("purchase_date must match YYYY-MM-DDTHH:MM:SSZ (got '{input}')")]
pub struct PurchaseDateError {
    /// The rejected input.
    pub input: String,
}

/// A UTC purchase timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PurchaseDate(DateTime<Utc>);

impl PurchaseDate {
    /// Parse from the fixed wire format.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseDateError` if the input does not match
    /// [`PURCHASE_DATE_FORMAT`].
    pub fn parse(s: &str) -> Result<Self, PurchaseDateError> {
        NaiveDateTime::parse_from_str(s, PURCHASE_DATE_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|_| PurchaseDateError {
                input: s.to_owned(),
            })
    }

    /// The underlying UTC timestamp.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for PurchaseDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for PurchaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PURCHASE_DATE_FORMAT))
    }
}

impl std::str::FromStr for PurchaseDate {
    type Err = PurchaseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PurchaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PurchaseDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
