//! Customer and order route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use marketplace_bridge_core::CustomerId;

use crate::db::{CustomerRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::models::{
    CreateCustomerRequest, CreateOrderRequest, CustomerCreated, OrderCreated, OrderView,
};
use crate::state::AppState;

/// Create a customer.
///
/// # Route
///
/// `POST /customers`
#[instrument(skip_all)]
pub async fn create_customer(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerCreated>)> {
    let Json(request) = payload?;
    let customer = request.validate()?;

    let created = CustomerRepository::new(state.pool()).create(&customer).await?;

    Ok((StatusCode::CREATED, Json(CustomerCreated::new(created.id))))
}

/// Create an order for an existing customer.
///
/// # Route
///
/// `POST /orders`
#[instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let Json(request) = payload?;
    let order = request.validate()?;

    let created = OrderRepository::new(state.pool()).create(&order).await?;

    Ok((StatusCode::CREATED, Json(OrderCreated::new(created.order_id))))
}

/// List a customer's orders in insertion order.
///
/// Responds 404 when the customer has no orders.
///
/// # Route
///
/// `GET /customers/{id}/orders`
#[instrument(skip(state, id))]
pub async fn list_orders(
    State(state): State<AppState>,
    id: std::result::Result<Path<CustomerId>, PathRejection>,
) -> Result<Json<Vec<OrderView>>> {
    let Path(customer_id) = id?;

    let orders = OrderRepository::new(state.pool())
        .list_by_customer(customer_id)
        .await?;

    if orders.is_empty() {
        return Err(AppError::NotFound(
            "No orders found for this customer".to_string(),
        ));
    }

    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}
