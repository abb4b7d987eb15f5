//! Authentication extractors.
//!
//! The bridge does not authenticate storefront users itself. Routes that act
//! on a seller's behalf take the seller's LWA access token from the
//! `Authorization` header and forward it to SP-API.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;

/// Extractor for a caller-supplied access token.
///
/// Accepts `Authorization: Bearer <token>` as well as a bare
/// `Authorization: <token>`. Rejects with 401 when the header is missing or
/// blank.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(BearerToken(token): BearerToken) -> impl IntoResponse {
///     state.spapi().get_orders(&token, since).await
/// }
/// ```
#[derive(Debug)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_authorization)
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Missing access token".to_string()))
    }
}

/// Strip an optional `Bearer ` prefix (case-insensitive).
fn parse_authorization(value: &str) -> Option<String> {
    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    (!token.is_empty()).then(|| token.to_string())
}
