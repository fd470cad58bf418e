//! Paid content access check.

use crate::identity::IdentityProvider;
use crate::server::state::{AppState, Backend};
use axum::{Json, extract::State};
use comicvault_billing::AccessDecision;
use comicvault_web::{AnonymousSession, BearerToken, CorrelationId, WebResult};

/// `GET /api/access`
///
/// Combines the signed-in user (bearer token, optional) and the anonymous
/// session cookie. An unknown or expired token is treated as signed out.
///
/// # Errors
///
/// - Identity platform unreachable → 502
/// - Store failure → 500
pub async fn check<B: Backend>(
    State(state): State<AppState<B>>,
    correlation_id: CorrelationId,
    AnonymousSession(session): AnonymousSession,
    BearerToken(token): BearerToken,
) -> WebResult<Json<AccessDecision>> {
    let user_id = match token {
        Some(token) => state.identity.authenticate(&token).await?,
        None => None,
    };

    let decision = state.access.check(user_id, session).await?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        user_id = ?user_id,
        session_id = ?session,
        granted = decision.granted,
        "Access checked"
    );

    Ok(Json(decision))
}
