//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use marketplace_bridge_core::{CustomerId, OrderId};

use super::{RepositoryError, classify};
use crate::models::{NewOrder, Order};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    order_id: String,
    status: String,
    total: Decimal,
    purchase_date: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            order_id: row.order_id,
            status: row.status,
            total: row.total,
            purchase_date: row.purchase_date.into(),
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `order_id` already exists.
    /// Returns `RepositoryError::InvalidReference` if the customer does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO customer_order (customer_id, order_id, status, total, purchase_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_id, order_id, status, total, purchase_date
            ",
        )
        .bind(order.customer_id)
        .bind(&order.order_id)
        .bind(&order.status)
        .bind(order.total)
        .bind(order.purchase_date.as_datetime())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            classify(
                e,
                "order_id already exists",
                &format!("customer {} does not exist", order.customer_id),
            )
        })?;

        tx.commit().await?;

        tracing::info!(order_id = %row.order_id, customer_id = %row.customer_id, "order created");
        Ok(row.into())
    }

    /// List a customer's orders in insertion order.
    ///
    /// Returns an empty vector when the customer has no orders (or does not
    /// exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, order_id, status, total, purchase_date
            FROM customer_order
            WHERE customer_id = $1
            ORDER BY id
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}
