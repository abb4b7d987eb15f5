//! `PostgreSQL` credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marketplace_bridge_core::SellingPartnerId;

use super::RepositoryError;
use crate::amazon::TokenBundle;
use crate::services::credentials::{CredentialStore, TokenRecord};

#[derive(sqlx::FromRow)]
struct TokenRow {
    selling_partner_id: String,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for TokenRecord {
    type Error = RepositoryError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let selling_partner_id = SellingPartnerId::parse(&row.selling_partner_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid selling_partner_id in database: {e}"))
        })?;
        Ok(Self {
            selling_partner_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
        })
    }
}

/// Credential store backed by the `oauth_token` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a store on top of `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    /// Save or update the tokens for a partner.
    ///
    /// Uses upsert to handle both first consent and re-authentication.
    async fn save_tokens(
        &self,
        partner: &SellingPartnerId,
        tokens: &TokenBundle,
    ) -> Result<TokenRecord, RepositoryError> {
        let record = TokenRecord::issued_now(partner.clone(), tokens);
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TokenRow>(
            r"
            INSERT INTO oauth_token (selling_partner_id, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (selling_partner_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING selling_partner_id, access_token, refresh_token, expires_at
            ",
        )
        .bind(record.selling_partner_id.as_str())
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(record.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(selling_partner_id = %partner, "tokens stored");
        row.try_into()
    }

    async fn load_tokens(
        &self,
        partner: &SellingPartnerId,
    ) -> Result<TokenRecord, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r"
            SELECT selling_partner_id, access_token, refresh_token, expires_at
            FROM oauth_token
            WHERE selling_partner_id = $1
            ",
        )
        .bind(partner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
