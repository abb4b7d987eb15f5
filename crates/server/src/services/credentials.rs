//! OAuth credential storage.
//!
//! Tokens are stored per selling partner id. Saving is an upsert: the first
//! completed consent inserts a record, later ones overwrite it. Records are
//! never deleted.
//!
//! Two backends implement [`CredentialStore`]:
//!
//! - [`PgCredentialStore`](crate::db::PgCredentialStore) - durable, the default
//! - [`MemoryCredentialStore`] - process-local, lost on restart

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use moka::future::Cache;
use serde::Serialize;

use marketplace_bridge_core::SellingPartnerId;

use crate::amazon::TokenBundle;
use crate::db::RepositoryError;

/// A stored token pair for one selling partner.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub selling_partner_id: SellingPartnerId,
    pub access_token: String,
    pub refresh_token: String,
    /// Issue time plus `expires_in`.
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Build a record from a freshly issued bundle.
    #[must_use]
    pub fn issued_now(selling_partner_id: SellingPartnerId, tokens: &TokenBundle) -> Self {
        Self {
            selling_partner_id,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: expires_at(Utc::now(), tokens.expires_in),
        }
    }

    /// Seconds until the access token expires, never negative.
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("selling_partner_id", &self.selling_partner_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// `issued_at + expires_in` seconds, saturating at the maximum timestamp.
#[must_use]
pub fn expires_at(issued_at: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(expires_in)
        .and_then(|delta| issued_at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Persistence for selling partner OAuth tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert or overwrite the tokens for `partner`.
    ///
    /// `expires_at` is computed from `tokens.expires_in` at call time. The
    /// write is atomic: either all fields are replaced or none are.
    async fn save_tokens(
        &self,
        partner: &SellingPartnerId,
        tokens: &TokenBundle,
    ) -> Result<TokenRecord, RepositoryError>;

    /// Load the tokens for `partner`.
    ///
    /// Returns `RepositoryError::NotFound` if the partner never completed
    /// consent.
    async fn load_tokens(&self, partner: &SellingPartnerId)
    -> Result<TokenRecord, RepositoryError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// In-memory credential store backed by a `moka` cache.
///
/// Entries never expire; the store lives as long as the process.
#[derive(Clone)]
pub struct MemoryCredentialStore {
    cache: Cache<SellingPartnerId, TokenRecord>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    /// Number of stored partners.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Whether no partner has stored tokens.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save_tokens(
        &self,
        partner: &SellingPartnerId,
        tokens: &TokenBundle,
    ) -> Result<TokenRecord, RepositoryError> {
        let record = TokenRecord::issued_now(partner.clone(), tokens);
        self.cache.insert(partner.clone(), record.clone()).await;
        tracing::debug!(selling_partner_id = %partner, "tokens stored in memory");
        Ok(record)
    }

    async fn load_tokens(
        &self,
        partner: &SellingPartnerId,
    ) -> Result<TokenRecord, RepositoryError> {
        self.cache.get(partner).await.ok_or(RepositoryError::NotFound)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bundle(access: &str, refresh: &str, expires_in: i64) -> TokenBundle {
        TokenBundle {
            access_token: access.to_owned(),
            refresh_token: refresh.to_owned(),
            expires_in,
        }
    }

    fn partner() -> SellingPartnerId {
        SellingPartnerId::parse("A3EXAMPLE9XYZ").unwrap()
    }

    #[tokio::test]
    async fn test_saved_tokens_expire_after_expires_in() {
        let store = MemoryCredentialStore::new();
        store
            .save_tokens(&partner(), &bundle("Atza|A", "Atzr|R", 3600))
            .await
            .unwrap();

        let record = store.load_tokens(&partner()).await.unwrap();
        let expected = Utc::now() + TimeDelta::seconds(3600);
        assert!((record.expires_at - expected).num_milliseconds().abs() <= 1000);
        assert_eq!(record.access_token, "Atza|A");
        assert_eq!(record.refresh_token, "Atzr|R");
    }

    #[tokio::test]
    async fn test_second_save_overwrites() {
        let store = MemoryCredentialStore::new();
        store
            .save_tokens(&partner(), &bundle("Atza|1", "Atzr|1", 3600))
            .await
            .unwrap();
        store
            .save_tokens(&partner(), &bundle("Atza|2", "Atzr|2", 1800))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let record = store.load_tokens(&partner()).await.unwrap();
        assert_eq!(record.access_token, "Atza|2");
        assert_eq!(record.refresh_token, "Atzr|2");
        assert!(record.expires_in() <= 1800);
    }

    #[tokio::test]
    async fn test_unknown_partner_is_not_found() {
        let store = MemoryCredentialStore::new();
        let err = store.load_tokens(&partner()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_expires_at_saturates() {
        let now = Utc::now();
        assert_eq!(expires_at(now, i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(expires_at(now, 60), now + TimeDelta::seconds(60));
    }

    #[test]
    fn test_record_debug_redacts_tokens() {
        let record = TokenRecord::issued_now(partner(), &bundle("Atza|secret", "Atzr|secret", 60));
        let debug = format!("{record:?}");
        assert!(debug.contains("A3EXAMPLE9XYZ"));
        assert!(!debug.contains("secret"));
    }
}
