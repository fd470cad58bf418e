//! Sign-in callback.
//!
//! The auth platform redirects here after sign-in. The code is exchanged for
//! the user, any day pass on the visitor's anonymous session is merged onto
//! the account, and the browser continues to `next`.

use super::frontend_url;
use crate::identity::IdentityProvider;
use crate::metrics;
use crate::server::state::{AppState, Backend};
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use comicvault_web::AnonymousSession;
use serde::Deserialize;

/// Query of the sign-in callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code.
    #[serde(default)]
    pub code: Option<String>,
    /// Path to continue to after sign-in.
    #[serde(default)]
    pub next: Option<String>,
}

/// `GET /auth/callback?code=…&next=…`
///
/// A failed merge never blocks sign-in.
pub async fn callback<B: Backend>(
    State(state): State<AppState<B>>,
    AnonymousSession(session): AnonymousSession,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let app_url = &state.settings.app_url;

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Redirect::to(&frontend_url(app_url, "/auth/error", &[("reason", "missing_code")]));
    };

    let user_id = match state.identity.exchange_code(&code).await {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::warn!(%error, "Sign-in code exchange failed");
            return Redirect::to(&frontend_url(
                app_url,
                "/auth/error",
                &[("reason", "exchange_failed")],
            ));
        }
    };

    if let Some(session_id) = session {
        match state.merger.merge(session_id, user_id).await {
            Ok(merged) => metrics::record_merge(merged),
            Err(error) => {
                tracing::error!(
                    session_id = %session_id,
                    user_id = %user_id,
                    %error,
                    "Day pass merge failed; continuing sign-in"
                );
            }
        }
    }

    let next = sanitize_next(query.next.as_deref());
    Redirect::to(&format!("{app_url}{next}"))
}

/// Keep `next` on this site: a single leading slash, no scheme-relative or
/// backslash tricks. Anything else becomes `/`.
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}
