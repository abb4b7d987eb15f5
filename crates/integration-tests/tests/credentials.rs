//! `PostgreSQL` credential store.
//!
//! Run with: `cargo test -p marketplace-bridge-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use chrono::{TimeDelta, Utc};
use marketplace_bridge_core::SellingPartnerId;
use marketplace_bridge_integration_tests::{migrated_pool, unique};
use marketplace_bridge_server::amazon::TokenBundle;
use marketplace_bridge_server::db::{PgCredentialStore, RepositoryError};
use marketplace_bridge_server::services::CredentialStore;

fn bundle(access: &str, refresh: &str, expires_in: i64) -> TokenBundle {
    TokenBundle {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in,
    }
}

fn partner() -> SellingPartnerId {
    // Column holds at most 64 characters
    SellingPartnerId::parse(&unique("A")).unwrap()
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_saved_tokens_expire_after_lifetime() {
    let store = PgCredentialStore::new(migrated_pool().await);
    let partner = partner();

    let before = Utc::now();
    store.save_tokens(&partner, &bundle("Atza|A", "Atzr|R", 3600)).await.unwrap();

    let record = store.load_tokens(&partner).await.unwrap();
    assert_eq!(record.access_token, "Atza|A");
    assert_eq!(record.refresh_token, "Atzr|R");
    let expected = before + TimeDelta::seconds(3600);
    assert!((record.expires_at - expected).num_milliseconds().abs() < 1000);
    assert_eq!(store.backend(), "postgres");
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_reauthorization_overwrites_tokens() {
    let pool = migrated_pool().await;
    let store = PgCredentialStore::new(pool.clone());
    let partner = partner();

    store.save_tokens(&partner, &bundle("Atza|A1", "Atzr|R1", 3600)).await.unwrap();
    store.save_tokens(&partner, &bundle("Atza|A2", "Atzr|R2", 60)).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM oauth_token WHERE selling_partner_id = $1")
        .bind(partner.as_str())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let record = store.load_tokens(&partner).await.unwrap();
    assert_eq!(record.access_token, "Atza|A2");
    assert_eq!(record.refresh_token, "Atzr|R2");
    assert!(record.expires_in() <= 60);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_unknown_partner_is_not_found() {
    let store = PgCredentialStore::new(migrated_pool().await);
    let err = store.load_tokens(&partner()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}
