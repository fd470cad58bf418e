//! Anonymous day pass status.

use crate::server::state::{AppState, Backend};
use axum::{Json, extract::State};
use comicvault_billing::DayPassStatus;
use comicvault_web::{AnonymousSession, WebResult};

/// `GET /api/day-pass/status`
///
/// Status of the pass held by the session cookie. No cookie means no pass.
///
/// # Errors
///
/// Returns 500 if the day pass store fails.
pub async fn status<B: Backend>(
    State(state): State<AppState<B>>,
    AnonymousSession(session): AnonymousSession,
) -> WebResult<Json<DayPassStatus>> {
    let Some(session_id) = session else {
        return Ok(Json(DayPassStatus {
            active: false,
            expires_at: None,
        }));
    };

    Ok(Json(state.tracker.status(session_id).await?))
}
