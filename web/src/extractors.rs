//! Custom Axum extractors.
//!
//! - [`Authenticated`]: the [`Principal`] injected by the upstream auth gateway
//! - [`CorrelationId`]: the request's correlation id
//!
//! # Examples
//!
//! ```ignore
//! use growhub_web::extractors::{Authenticated, CorrelationId};
//!
//! async fn handler(
//!     Authenticated(principal): Authenticated,
//!     correlation_id: CorrelationId,
//! ) -> String {
//!     format!("{} via {}", principal.account_id, correlation_id.0)
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use growhub_core::{AccountId, CommerceError, Principal, Role};
use uuid::Uuid;

/// Header carrying the authenticated account id (UUID).
pub const ACCOUNT_ID_HEADER: &str = "X-Account-Id";

/// Header carrying the authenticated role (`member` or `staff`).
pub const ACCOUNT_ROLE_HEADER: &str = "X-Account-Role";

/// The caller as vouched for by the auth gateway.
///
/// Credentials are checked upstream; this extractor only reads the identity
/// headers. A missing or malformed account id is `401 Unauthenticated`. A
/// missing role means `member`.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(AccountId::from_uuid)
            .ok_or(CommerceError::Unauthenticated)?;

        let role = match parts.headers.get(ACCOUNT_ROLE_HEADER) {
            None => Role::Member,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(Role::parse)
                .ok_or_else(|| AppError::unauthorized("Unrecognized account role"))?,
        };

        Ok(Self(Principal { account_id, role }))
    }
}

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when the correlation middleware ran,
/// otherwise from the `X-Correlation-ID` header, otherwise freshly generated.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}
