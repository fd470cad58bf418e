//! Router configuration for the billing server.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::{AppState, Backend};
use crate::api::{access, auth, day_pass, paypal, paystack, session};
use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use comicvault_web::REQUEST_ID_HEADER;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Health checks
/// - Provider webhooks
/// - Paystack verify redirect
/// - Anonymous session, day pass status and access check
/// - Sign-in callback
///
/// Every request gets an `x-request-id` (kept if the client sent one) that is
/// echoed on the response and picked up by the `CorrelationId` extractor.
pub fn build_router<B: Backend>(state: AppState<B>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // API routes
    let api_routes = Router::new()
        // Provider webhooks (always acknowledged once parsed)
        .route("/webhooks/paypal/capture", post(paypal::capture_webhook::<B>))
        .route(
            "/webhooks/paypal/subscription",
            post(paypal::subscription_webhook::<B>),
        )
        .route("/webhooks/paystack", post(paystack::webhook::<B>))
        // Post-checkout redirect
        .route("/payments/paystack/verify", get(paystack::verify::<B>))
        // Anonymous visitors
        .route(
            "/session/anonymous",
            post(session::create_anonymous_session::<B>),
        )
        .route("/day-pass/status", get(day_pass::status::<B>))
        .route("/access", get(access::check::<B>));

    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<B>))
        .route("/auth/callback", get(auth::callback::<B>))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
