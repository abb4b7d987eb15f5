//! Marketplace Bridge Core - Shared types library.
//!
//! This crate provides common types used across all Marketplace Bridge components:
//! - `server` - HTTP integration layer between the storefront and the marketplace
//! - `cli` - Command-line tools for migrations, reports and fee estimates
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, customer fields, partner ids and timestamps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
