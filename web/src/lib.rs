//! Axum integration for ComicVault billing.
//!
//! The HTTP-facing pieces shared by the server's handlers:
//!
//! - [`AppError`]: JSON error responses, with a mapping from [`BillingError`]
//! - [`extractors`]: correlation id, anonymous session cookie, bearer token
//! - [`cookies`]: the anonymous session `Set-Cookie` value
//!
//! # Example
//!
//! ```ignore
//! use comicvault_web::{AppError, extractors::AnonymousSession};
//!
//! async fn day_pass_status(
//!     State(state): State<AppState>,
//!     AnonymousSession(session): AnonymousSession,
//! ) -> Result<Json<DayPassStatus>, AppError> {
//!     let Some(session) = session else {
//!         return Ok(Json(DayPassStatus::default()));
//!     };
//!     Ok(Json(state.tracker.status(session).await?))
//! }
//! ```
//!
//! [`BillingError`]: comicvault_billing::BillingError

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cookies;
pub mod error;
pub mod extractors;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{AnonymousSession, BearerToken, CorrelationId, REQUEST_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
