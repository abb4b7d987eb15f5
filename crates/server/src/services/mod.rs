//! Business logic services.
//!
//! # Services
//!
//! - `credentials` - Storage of selling partner OAuth tokens
//! - `oauth` - Seller consent callback handling

pub mod credentials;
pub mod oauth;

pub use credentials::{CredentialStore, MemoryCredentialStore, TokenRecord};
pub use oauth::{CallbackParams, OAuthError, OAuthService};
