//! Customer models.

use serde::{Deserialize, Serialize};

use marketplace_bridge_core::{CustomerId, CustomerName, Email};

use crate::error::AppError;

/// A stored customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: CustomerName,
    pub email: Email,
}

/// Body of `POST /customers`.
///
/// Both fields are optional at the JSON level so that a missing field is
/// reported with the same message as a blank one.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A validated customer ready for insertion.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: CustomerName,
    pub email: Email,
}

impl CreateCustomerRequest {
    /// Check required fields and formats.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a field is missing, blank or malformed.
    pub fn validate(self) -> Result<NewCustomer, AppError> {
        let (Some(name), Some(email)) = (
            self.name.filter(|s| !s.trim().is_empty()),
            self.email.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(AppError::BadRequest("Missing name or email".to_owned()));
        };

        let name = CustomerName::parse(&name).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let email = Email::parse(&email).map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(NewCustomer { name, email })
    }
}

/// Response of `POST /customers`.
#[derive(Debug, Serialize)]
pub struct CustomerCreated {
    pub message: &'static str,
    pub customer_id: CustomerId,
}

impl CustomerCreated {
    #[must_use]
    pub const fn new(customer_id: CustomerId) -> Self {
        Self {
            message: "Customer added successfully",
            customer_id,
        }
    }
}
