//! Custom Axum extractors.
//!
//! - `CorrelationId`: request id set by the request-id layer, or a fresh one
//! - `AnonymousSession`: session id from the `comic_anon_session` cookie
//! - `BearerToken`: access token from `Authorization: Bearer`
//!
//! All of them are infallible: a missing or malformed value becomes `None`
//! (or a generated id) and the handler decides what that means.
//!
//! # Examples
//!
//! ```ignore
//! use comicvault_web::extractors::{AnonymousSession, BearerToken, CorrelationId};
//!
//! async fn access(
//!     State(state): State<AppState>,
//!     correlation_id: CorrelationId,
//!     AnonymousSession(session): AnonymousSession,
//!     BearerToken(token): BearerToken,
//! ) -> Result<Json<AccessDecision>, AppError> {
//!     tracing::debug!(correlation_id = %correlation_id.0, "Checking access");
//!     ...
//! }
//! ```

use crate::cookies::read_cookie;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use comicvault_billing::AnonymousSessionId;
use comicvault_billing::constants::ANON_SESSION_COOKIE;
use uuid::Uuid;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID for request tracing.
///
/// Taken from the `x-request-id` header (set by the request-id layer when the
/// client did not send one), or generated if absent.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Anonymous session id from the session cookie.
///
/// `None` when the cookie is absent or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonymousSession(pub Option<AnonymousSessionId>);

#[async_trait]
impl<S> FromRequestParts<S> for AnonymousSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = read_cookie(&parts.headers, ANON_SESSION_COOKIE)
            .and_then(|value| AnonymousSessionId::parse(value).ok());

        Ok(Self(session))
    }
}

/// Bearer token from the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_parts(builder: axum::http::request::Builder) -> Parts {
        let (parts, ()) = builder.body(()).unwrap_or_default().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_anonymous_session_from_cookie() {
        let session = AnonymousSessionId::new();
        let mut parts = request_parts(
            Request::builder().header("cookie", format!("a=1; comic_anon_session={session}")),
        );

        let AnonymousSession(found) = AnonymousSession::from_request_parts(&mut parts, &())
            .await
            .unwrap_or(AnonymousSession(None));
        assert_eq!(found, Some(session));
    }

    #[tokio::test]
    async fn test_garbage_session_cookie_is_none() {
        let mut parts = request_parts(Request::builder().header("cookie", "comic_anon_session=nope"));
        let result = AnonymousSession::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Ok(AnonymousSession(None))));
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let mut parts = request_parts(Request::builder().header("authorization", "Bearer abc.def"));
        let result = BearerToken::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Ok(BearerToken(Some(ref t))) if t == "abc.def"));

        let mut parts = request_parts(Request::builder().header("authorization", "Basic xyz"));
        let result = BearerToken::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Ok(BearerToken(None))));
    }

    #[tokio::test]
    async fn test_correlation_id_from_request_id() {
        let id = Uuid::new_v4();
        let mut parts = request_parts(Request::builder().header(REQUEST_ID_HEADER, id.to_string()));
        let result = CorrelationId::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Ok(CorrelationId(found)) if found == id));
    }
}
