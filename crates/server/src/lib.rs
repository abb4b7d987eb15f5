//! Marketplace Bridge server library.
//!
//! HTTP integration layer between a storefront, its `PostgreSQL` database and
//! the Amazon Selling Partner API. Exposed as a library so the binary, the CLI
//! and the integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod amazon;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
