//! Selling partner identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`SellingPartnerId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SellingPartnerIdError {
    /// The id is empty or only whitespace.
    #[error("selling_partner_id cannot be empty")]
    Empty,
    /// The id does not fit the column.
    #[error("selling_partner_id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Marketplace account identifier, the key for stored OAuth credentials.
///
/// Amazon issues these as opaque alphanumeric strings (e.g. `A3EXAMPLE9XYZ`);
/// no format is assumed beyond non-empty and at most 64 characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SellingPartnerId(String);

impl SellingPartnerId {
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `SellingPartnerId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(s: &str) -> Result<Self, SellingPartnerIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SellingPartnerIdError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(SellingPartnerIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SellingPartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SellingPartnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = SellingPartnerId::parse(" A3EXAMPLE ").unwrap();
        assert_eq!(id.as_str(), "A3EXAMPLE");
    }

    #[test]
    fn test_parse_rejects_blank_and_long() {
        assert_eq!(SellingPartnerId::parse(" "), Err(SellingPartnerIdError::Empty));
        assert!(matches!(
            SellingPartnerId::parse(&"A".repeat(65)),
            Err(SellingPartnerIdError::TooLong { max: 64 })
        ));
    }
}
