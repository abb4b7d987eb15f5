//! Order models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketplace_bridge_core::{CustomerId, OrderId, PurchaseDate};

use crate::error::AppError;

/// Maximum length of the external order identifier.
pub const MAX_ORDER_ID_LENGTH: usize = 100;

/// Maximum length of an order status.
pub const MAX_STATUS_LENGTH: usize = 50;

/// Decimal places allowed in `total` (`NUMERIC(12, 2)`).
pub const TOTAL_SCALE: u32 = 2;

/// Digits allowed before the decimal point in `total`.
pub const MAX_TOTAL_INTEGER_DIGITS: u32 = 10;

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// External order identifier supplied by the storefront.
    pub order_id: String,
    pub status: String,
    pub total: Decimal,
    pub purchase_date: PurchaseDate,
}

/// Body of `POST /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub purchase_date: Option<String>,
}

/// A validated order ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub order_id: String,
    pub status: String,
    pub total: Decimal,
    pub purchase_date: PurchaseDate,
}

impl CreateOrderRequest {
    /// Check required fields and formats.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a field is missing or blank, too
    /// long, if `total` does not fit `NUMERIC(12, 2)`, or if `purchase_date`
    /// does not match `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn validate(self) -> Result<NewOrder, AppError> {
        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let (Some(customer_id), Some(order_id), Some(status), Some(total), Some(purchase_date)) = (
            self.customer_id,
            non_blank(self.order_id),
            non_blank(self.status),
            self.total,
            non_blank(self.purchase_date),
        ) else {
            return Err(AppError::BadRequest("Missing required fields".to_owned()));
        };

        if order_id.chars().count() > MAX_ORDER_ID_LENGTH {
            return Err(AppError::BadRequest(format!(
                "order_id must be at most {MAX_ORDER_ID_LENGTH} characters"
            )));
        }
        if status.chars().count() > MAX_STATUS_LENGTH {
            return Err(AppError::BadRequest(format!(
                "status must be at most {MAX_STATUS_LENGTH} characters"
            )));
        }

        check_total(total)?;

        let purchase_date =
            PurchaseDate::parse(&purchase_date).map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(NewOrder {
            customer_id,
            order_id,
            status,
            total,
            purchase_date,
        })
    }
}

/// Reject totals the `total` column cannot hold exactly.
fn check_total(total: Decimal) -> Result<(), AppError> {
    if total.normalize().scale() > TOTAL_SCALE {
        return Err(AppError::BadRequest(format!(
            "total must have at most {TOTAL_SCALE} decimal places"
        )));
    }
    if total.abs() >= Decimal::from(10_i64.pow(MAX_TOTAL_INTEGER_DIGITS)) {
        return Err(AppError::BadRequest(format!(
            "total must have at most {MAX_TOTAL_INTEGER_DIGITS} integer digits"
        )));
    }
    Ok(())
}

/// Response of `POST /orders`.
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub message: &'static str,
    /// External order identifier, echoed back.
    pub order_id: String,
}

impl OrderCreated {
    #[must_use]
    pub const fn new(order_id: String) -> Self {
        Self {
            message: "Order added successfully",
            order_id,
        }
    }
}

/// One entry of `GET /customers/{id}/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub purchase_date: PurchaseDate,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id,
            status: order.status,
            total: order.total,
            purchase_date: order.purchase_date,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_validate_complete_order() {
        let order = parse(json!({
            "customer_id": 1,
            "order_id": "O1",
            "status": "shipped",
            "total": 9.99,
            "purchase_date": "2025-01-04T10:00:00Z"
        }))
        .validate()
        .unwrap();

        assert_eq!(order.customer_id, CustomerId::new(1));
        assert_eq!(order.total, Decimal::new(999, 2));
        assert_eq!(order.purchase_date.to_string(), "2025-01-04T10:00:00Z");
    }

    #[test]
    fn test_validate_missing_fields() {
        let err = parse(json!({"customer_id": 1, "order_id": "O1", "status": "shipped"}))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Missing required fields");
    }

    #[test]
    fn test_validate_rejects_other_date_formats() {
        for date in ["2025-01-04", "2025-01-04T10:00:00+00:00", "2025-01-04 10:00:00"] {
            let err = parse(json!({
                "customer_id": 1,
                "order_id": "O1",
                "status": "shipped",
                "total": 9.99,
                "purchase_date": date
            }))
            .validate()
            .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("purchase_date")));
        }
    }

    #[test]
    fn test_validate_rejects_long_status() {
        let err = parse(json!({
            "customer_id": 1,
            "order_id": "O1",
            "status": "s".repeat(MAX_STATUS_LENGTH + 1),
            "total": 1,
            "purchase_date": "2025-01-04T10:00:00Z"
        }))
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    fn order_with_total(total: serde_json::Value) -> Result<NewOrder, AppError> {
        parse(json!({
            "customer_id": 1,
            "order_id": "O1",
            "status": "shipped",
            "total": total,
            "purchase_date": "2025-01-04T10:00:00Z"
        }))
        .validate()
    }

    #[test]
    fn test_validate_total_scale() {
        assert_eq!(order_with_total(json!(10.5)).unwrap().total, Decimal::new(105, 1));

        let err = order_with_total(json!(9.999)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("decimal places")));
    }

    #[test]
    fn test_validate_total_integer_digits() {
        let largest = order_with_total(json!(9_999_999_999.99_f64)).unwrap();
        assert_eq!(largest.total, Decimal::new(999_999_999_999, 2));

        let err = order_with_total(json!(1.0e10)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("integer digits")));

        let err = order_with_total(json!(1.0e12)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("integer digits")));
    }

    #[test]
    fn test_order_view_wire_shape() {
        let view = OrderView {
            order_id: "O1".to_owned(),
            status: "shipped".to_owned(),
            total: Decimal::new(999, 2),
            purchase_date: PurchaseDate::parse("2025-01-04T10:00:00Z").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "order_id": "O1",
                "status": "shipped",
                "total": 9.99,
                "purchase_date": "2025-01-04T10:00:00Z"
            })
        );
    }
}
