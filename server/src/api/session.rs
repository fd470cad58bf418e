//! Anonymous session issuance.

use crate::server::state::{AppState, Backend};
use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use comicvault_billing::AnonymousSessionId;
use comicvault_web::AnonymousSession;
use comicvault_web::cookies::anonymous_session_cookie;
use serde::Serialize;

/// Response of `POST /api/session/anonymous`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session id carried by the cookie.
    pub session_id: AnonymousSessionId,
    /// Whether this request issued it.
    pub created: bool,
}

/// `POST /api/session/anonymous`
///
/// Returns the caller's session id, issuing a new one (and its cookie) when
/// the request carries none. Called before an anonymous checkout so the
/// payment metadata can name the session.
pub async fn create_anonymous_session<B: Backend>(
    State(state): State<AppState<B>>,
    AnonymousSession(existing): AnonymousSession,
) -> Response {
    if let Some(session_id) = existing {
        return Json(SessionResponse {
            session_id,
            created: false,
        })
        .into_response();
    }

    let session_id = AnonymousSessionId::new();
    tracing::debug!(session_id = %session_id, "Issued anonymous session");

    (
        [(
            SET_COOKIE,
            anonymous_session_cookie(session_id, state.settings.secure_cookies),
        )],
        Json(SessionResponse {
            session_id,
            created: true,
        }),
    )
        .into_response()
}
