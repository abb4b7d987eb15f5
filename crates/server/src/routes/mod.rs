//! HTTP route handlers for the bridge.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Banner
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//! GET  /db-test                   - Database connectivity report (JSON)
//!
//! # Customers and orders
//! POST /customers                 - Create customer
//! POST /orders                    - Create order
//! GET  /customers/{id}/orders     - List a customer's orders
//!
//! # Seller consent
//! GET  /start-oauth               - Redirect to Seller Central consent
//! GET  /callback                  - Handle consent callback
//! GET  /dashboard                 - Stored tokens for a selling partner
//! POST /auth/amazon               - Frontend code exchange (not stored)
//!
//! # Selling Partner API
//! GET  /user/orders               - Orders with the caller's access token
//! ```

pub mod customers;
pub mod health;
pub mod marketplace;
pub mod oauth;

use axum::{
    Router,
    extract::Request,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the customer and order routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(customers::create_customer))
        .route("/customers/{id}/orders", get(customers::list_orders))
        .route("/orders", post(customers::create_order))
}

/// Create the seller consent routes router.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/start-oauth", get(oauth::start_oauth))
        .route("/callback", get(oauth::callback))
        .route("/dashboard", get(oauth::dashboard))
        .route("/auth/amazon", post(oauth::auth_amazon))
}

/// Create all routes for the bridge.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/db-test", get(health::db_test))
        .route("/user/orders", get(marketplace::user_orders))
        .merge(customer_routes())
        .merge(oauth_routes())
}

/// Build the application with its middleware stack.
///
/// Sentry layers are added by the binary, outermost.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    Router::new()
        .merge(routes())
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Json;
    use axum::body::{Body, to_bytes};
    use axum::extract::Form;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::OAuthStateMode;
    use crate::services::{CredentialStore, MemoryCredentialStore};
    use crate::test_support::{config_for, memory_state, spawn_upstream};
    use marketplace_bridge_core::SellingPartnerId;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    /// `name=value` part of the session cookie.
    fn session_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn query_param(url: &str, name: &str) -> String {
        let parsed = url::Url::parse(url).unwrap();
        parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    async fn lwa_upstream() -> String {
        async fn token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
            match form.get("code").map(String::as_str) {
                Some("good-code") => Json(json!({
                    "access_token": "Atza|A",
                    "refresh_token": "Atzr|R",
                    "expires_in": 3600
                })),
                Some("string-expiry") => Json(json!({
                    "access_token": "Atza|A",
                    "refresh_token": "Atzr|R",
                    "expires_in": "3600"
                })),
                Some("access-only") => Json(json!({"access_token": "Atza|F", "expires_in": 3600})),
                _ => Json(json!({"error": "invalid_grant", "error_description": "bad code"})),
            }
        }
        let app = Router::new()
            .route("/auth/o2/token", post(token))
            .route(
                "/user/profile",
                get(|| async { Json(json!({"user_id": "amzn1.account.X", "name": "Jane"})) }),
            );
        spawn_upstream(app).await
    }

    fn test_app(upstream: &str) -> (Router, MemoryCredentialStore) {
        let (state, store) = memory_state(config_for(upstream));
        (app(state, MemoryStore::default()), store)
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (app, _) = test_app("http://127.0.0.1:1");

        let response = app.clone().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], health::BANNER.as_bytes());

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_consent_flow_round_trip() {
        let upstream = lwa_upstream().await;
        let (app, store) = test_app(&upstream);

        let response = app.clone().oneshot(get_request("/start-oauth")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        let consent = location(&response);
        assert!(consent.starts_with(&format!("{upstream}/apps/authorize/consent?")));
        let state = query_param(&consent, "state");
        assert_eq!(state.len(), 32);
        let cookie = session_cookie(&response);

        let callback = format!(
            "/callback?spapi_oauth_code=good-code&selling_partner_id=A3EXAMPLE9XYZ&state={state}"
        );
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(&callback)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/dashboard?selling_partner_id=A3EXAMPLE9XYZ");

        let partner = SellingPartnerId::parse("A3EXAMPLE9XYZ").unwrap();
        assert_eq!(store.load_tokens(&partner).await.unwrap().access_token, "Atza|A");

        let response = app
            .clone()
            .oneshot(get_request("/dashboard?selling_partner_id=A3EXAMPLE9XYZ"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["selling_partner_id"], "A3EXAMPLE9XYZ");
        assert_eq!(body["access_token"], "Atza|A");
        assert_eq!(body["refresh_token"], "Atzr|R");
        assert!(body["expires_in"].as_i64().unwrap() > 3500);

        // The state is single-use
        let response = app
            .oneshot(
                Request::builder()
                    .uri(&callback)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_without_session_state_is_rejected() {
        let upstream = lwa_upstream().await;
        let (app, store) = test_app(&upstream);

        let response = app
            .oneshot(get_request(
                "/callback?spapi_oauth_code=good-code&selling_partner_id=A3EXAMPLE9XYZ&state=guess",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid OAuth state");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_callback_with_static_state() {
        let upstream = lwa_upstream().await;
        let mut config = config_for(&upstream);
        config.oauth.state = OAuthStateMode::Static("stateexample".to_owned());
        let (state, store) = memory_state(config);
        let app = app(state, MemoryStore::default());

        let response = app
            .clone()
            .oneshot(get_request("/start-oauth"))
            .await
            .unwrap();
        assert!(location(&response).contains("state=stateexample"));

        let response = app
            .clone()
            .oneshot(get_request(
                "/callback?spapi_oauth_code=bad-code&selling_partner_id=A3EXAMPLE9XYZ",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("invalid_grant"));
        assert!(store.is_empty().await);

        let response = app
            .oneshot(get_request(
                "/callback?spapi_oauth_code=good-code&selling_partner_id=A3EXAMPLE9XYZ",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(store.len().await, 1);
    }

    fn static_state_app(upstream: &str) -> (Router, MemoryCredentialStore) {
        let mut config = config_for(upstream);
        config.oauth.state = OAuthStateMode::Static("stateexample".to_owned());
        let (state, store) = memory_state(config);
        (app(state, MemoryStore::default()), store)
    }

    #[tokio::test]
    async fn test_callback_malformed_token_response_is_bad_request() {
        let upstream = lwa_upstream().await;
        let (app, store) = static_state_app(&upstream);

        let response = app
            .oneshot(get_request(
                "/callback?spapi_oauth_code=string-expiry&selling_partner_id=A3EXAMPLE9XYZ",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("3600"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_callback_unreachable_token_endpoint_is_bad_request() {
        let (app, store) = static_state_app("http://127.0.0.1:1");

        let response = app
            .oneshot(get_request(
                "/callback?spapi_oauth_code=good-code&selling_partner_id=A3EXAMPLE9XYZ",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(response).await["error"]
                .as_str()
                .unwrap()
                .starts_with("Token exchange failed")
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_callback_missing_parameters() {
        let (app, _) = test_app("http://127.0.0.1:1");

        for uri in [
            "/callback?selling_partner_id=A3EXAMPLE9XYZ",
            "/callback?spapi_oauth_code=code",
            "/callback",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_dashboard_errors() {
        let (app, _) = test_app("http://127.0.0.1:1");

        let response = app.clone().oneshot(get_request("/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing selling_partner_id");

        let response = app
            .oneshot(get_request("/dashboard?selling_partner_id=A0UNKNOWN"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_amazon() {
        let upstream = lwa_upstream().await;
        let (app, store) = test_app(&upstream);

        let response = app
            .clone()
            .oneshot(json_request("/auth/amazon", &json!({"code": "good-code"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["access_token"], "Atza|A");
        assert_eq!(body["user"]["name"], "Jane");
        assert!(store.is_empty().await);

        let response = app
            .clone()
            .oneshot(json_request("/auth/amazon", &json!({"code": "access-only"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["access_token"], "Atza|F");

        let response = app
            .clone()
            .oneshot(json_request("/auth/amazon", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Authorization code is required");

        let response = app
            .oneshot(json_request("/auth/amazon", &json!({"code": "bad-code"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_orders() {
        let spapi = Router::new().route(
            "/orders/v0/orders",
            get(|headers: axum::http::HeaderMap| async move {
                match headers.get("x-amz-access-token").and_then(|v| v.to_str().ok()) {
                    Some("Atza|seller") => {
                        (StatusCode::OK, Json(json!({"payload": {"Orders": [{"AmazonOrderId": "111-1"}]}})))
                    }
                    _ => (StatusCode::FORBIDDEN, Json(json!({"errors": [{"code": "Unauthorized"}]}))),
                }
            }),
        );
        let upstream = spawn_upstream(spapi).await;
        let (app, _) = test_app(&upstream);

        let response = app.clone().oneshot(get_request("/user/orders")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Missing access token");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/user/orders?created_after=2025-01-04")
                    .header(header::AUTHORIZATION, "Bearer Atza|seller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["payload"]["Orders"][0]["AmazonOrderId"], "111-1");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user/orders")
                    .header(header::AUTHORIZATION, "Atza|expired")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn test_customer_validation_happens_before_database() {
        let (app, _) = test_app("http://127.0.0.1:1");

        let response = app
            .clone()
            .oneshot(json_request("/customers", &json!({"name": "Jane"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing name or email");

        let response = app
            .clone()
            .oneshot(json_request(
                "/orders",
                &json!({
                    "customer_id": 1,
                    "order_id": "O1",
                    "status": "shipped",
                    "total": 9.99,
                    "purchase_date": "04/01/2025"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/customers")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_list_orders_rejects_non_numeric_id() {
        let (app, _) = test_app("http://127.0.0.1:1");
        let response = app
            .oneshot(get_request("/customers/abc/orders"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
