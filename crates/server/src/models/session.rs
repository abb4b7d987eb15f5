//! Session-related types.

/// Session keys used by the OAuth flow.
pub mod keys {
    /// Key for the per-request OAuth `state` value (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";
}
