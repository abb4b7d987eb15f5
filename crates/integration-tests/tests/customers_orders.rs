//! Customer and order persistence against a real `PostgreSQL` database.
//!
//! Run with: `cargo test -p marketplace-bridge-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use marketplace_bridge_core::{CustomerId, CustomerName, Email, PurchaseDate};
use marketplace_bridge_integration_tests::{app, migrated_pool, unique};
use marketplace_bridge_server::db::{CustomerRepository, OrderRepository, RepositoryError};
use marketplace_bridge_server::models::{NewCustomer, NewOrder};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

async fn create_customer(pool: &PgPool) -> CustomerId {
    let customer = NewCustomer {
        name: CustomerName::parse("Jane").unwrap(),
        email: Email::parse(&format!("{}@example.com", unique("jane"))).unwrap(),
    };
    CustomerRepository::new(pool).create(&customer).await.unwrap().id
}

fn new_order(customer_id: CustomerId, order_id: &str, hour: u32) -> NewOrder {
    NewOrder {
        customer_id,
        order_id: order_id.to_string(),
        status: "shipped".to_string(),
        total: Decimal::new(999, 2),
        purchase_date: PurchaseDate::from(Utc.with_ymd_and_hms(2025, 1, 4, hour, 0, 0).unwrap()),
    }
}

fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_create_and_fetch_customer() {
    let pool = migrated_pool().await;
    let email = format!("{}@example.com", unique("fetch"));
    let repo = CustomerRepository::new(&pool);

    let created = repo
        .create(&NewCustomer {
            name: CustomerName::parse("Jane").unwrap(),
            email: Email::parse(&email).unwrap(),
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.email.as_str(), email);
    assert_eq!(fetched.name.as_str(), "Jane");
    assert!(repo.get_by_id(CustomerId::new(i32::MAX)).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_duplicate_email_is_a_conflict() {
    let pool = migrated_pool().await;
    let email = format!("{}@example.com", unique("dup"));
    let customer = NewCustomer {
        name: CustomerName::parse("Jane").unwrap(),
        email: Email::parse(&email).unwrap(),
    };
    let repo = CustomerRepository::new(&pool);

    let first = repo.create(&customer).await.unwrap();
    let err = repo.create(&customer).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    // The failed insert leaves the first row alone
    assert!(repo.get_by_id(first.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_order_for_unknown_customer_is_rejected() {
    let pool = migrated_pool().await;
    let order = new_order(CustomerId::new(i32::MAX), &unique("O"), 10);

    let err = OrderRepository::new(&pool).create(&order).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidReference(_)));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_duplicate_order_id_is_a_conflict() {
    let pool = migrated_pool().await;
    let customer_id = create_customer(&pool).await;
    let order_id = unique("O");
    let repo = OrderRepository::new(&pool);

    repo.create(&new_order(customer_id, &order_id, 10)).await.unwrap();
    let err = repo.create(&new_order(customer_id, &order_id, 11)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_orders_are_listed_in_insertion_order() {
    let pool = migrated_pool().await;
    let customer_id = create_customer(&pool).await;
    let other_customer = create_customer(&pool).await;
    let repo = OrderRepository::new(&pool);

    // Later purchase date inserted first
    let first = unique("O");
    let second = unique("O");
    repo.create(&new_order(customer_id, &first, 12)).await.unwrap();
    repo.create(&new_order(other_customer, &unique("O"), 9)).await.unwrap();
    repo.create(&new_order(customer_id, &second, 8)).await.unwrap();

    let orders = repo.list_by_customer(customer_id).await.unwrap();
    let ids: Vec<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, [first.as_str(), second.as_str()]);
    assert_eq!(orders[0].total, Decimal::new(999, 2));
    assert_eq!(orders[0].purchase_date.to_string(), "2025-01-04T12:00:00Z");

    assert!(repo.list_by_customer(CustomerId::new(i32::MAX)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_customer_order_scenario_over_http() {
    let pool = migrated_pool().await;
    let app = app(pool);
    let email = format!("{}@x.com", unique("jane"));
    let order_id = unique("O1");

    let response = app
        .clone()
        .oneshot(json_post("/customers", &json!({"name": "Jane", "email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Customer added successfully");
    let customer_id = body["customer_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_post("/customers", &json!({"name": "Jane", "email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_post(
            "/orders",
            &json!({
                "customer_id": customer_id,
                "order_id": order_id,
                "status": "shipped",
                "total": 9.99,
                "purchase_date": "2025-01-04T10:00:00Z"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["order_id"], order_id.as_str());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/customers/{customer_id}/orders"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([{
            "order_id": order_id,
            "status": "shipped",
            "total": 9.99,
            "purchase_date": "2025-01-04T10:00:00Z"
        }])
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/customers/{}/orders", i32::MAX))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "No orders found for this customer");

    let response = app
        .oneshot(Request::builder().uri("/db-test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
