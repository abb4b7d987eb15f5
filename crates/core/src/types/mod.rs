//! Core types for Marketplace Bridge.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the server and the CLI.

pub mod customer;
pub mod id;
pub mod partner;
pub mod purchase_date;

pub use customer::{CustomerName, CustomerNameError, Email, EmailError};
pub use id::*;
pub use partner::{SellingPartnerId, SellingPartnerIdError};
pub use purchase_date::{PURCHASE_DATE_FORMAT, PurchaseDate, PurchaseDateError};
