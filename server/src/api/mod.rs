//! HTTP handlers.
//!
//! - [`paypal`]: capture and subscription webhooks
//! - [`paystack`]: webhook and the post-checkout verify redirect
//! - [`session`]: anonymous session issuance
//! - [`day_pass`]: anonymous day pass status
//! - [`access`]: paid content access check
//! - [`auth`]: sign-in callback with day pass merge

pub mod access;
pub mod auth;
pub mod day_pass;
pub mod paypal;
pub mod paystack;
pub mod session;

use crate::metrics;
use comicvault_billing::{BillingError, ReconcileOutcome, SignaturePolicy};
use comicvault_web::AppError;
use serde::Serialize;

/// Body of every acknowledged webhook.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Always `true`; the provider must not redeliver.
    pub received: bool,
    /// Provider event name.
    pub event: String,
    /// What the delivery did (`applied`, `ignored`, `dropped`, ...).
    pub outcome: &'static str,
}

impl WebhookAck {
    fn new(event: String, outcome: &'static str) -> Self {
        Self {
            received: true,
            event,
            outcome,
        }
    }
}

/// Apply the signature policy to a failed verification.
///
/// Strict rejects with 401. Lenient logs and lets the delivery through.
fn signature_failure(
    policy: SignaturePolicy,
    provider: &'static str,
    reason: &str,
) -> Result<(), AppError> {
    if policy.is_strict() {
        tracing::error!(provider, reason, "Webhook signature rejected");
        metrics::record_webhook(provider, "rejected");
        return Err(BillingError::InvalidSignature.into());
    }

    tracing::warn!(
        provider,
        reason,
        "Webhook signature did not verify; processing anyway (lenient policy)"
    );
    Ok(())
}

/// Record a reconciliation on both counters and build the acknowledgement.
fn acknowledge(provider: &'static str, event: String, outcome: &ReconcileOutcome) -> WebhookAck {
    metrics::record_reconciliation(outcome.label());
    metrics::record_webhook(provider, outcome.label());
    WebhookAck::new(event, outcome.label())
}

/// Acknowledge a delivery whose event type is not modelled.
fn ignore(provider: &'static str, event: String) -> WebhookAck {
    tracing::warn!(provider, event = %event, "Ignoring unhandled webhook event");
    metrics::record_webhook(provider, "ignored");
    WebhookAck::new(event, "ignored")
}

/// `{app_url}{path}?{query}`.
fn frontend_url(app_url: &str, path: &str, query: &[(&str, &str)]) -> String {
    match serde_urlencoded::to_string(query) {
        Ok(encoded) if !encoded.is_empty() => format!("{app_url}{path}?{encoded}"),
        _ => format!("{app_url}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_url_encodes_query() {
        let url = frontend_url(
            "https://comics.example",
            "/payment/error",
            &[("status", "failed"), ("reference", "ref 1&2")],
        );
        assert_eq!(
            url,
            "https://comics.example/payment/error?status=failed&reference=ref+1%262"
        );
    }

    #[test]
    fn test_frontend_url_without_query() {
        assert_eq!(
            frontend_url("https://comics.example", "/", &[]),
            "https://comics.example/"
        );
    }

    #[test]
    fn test_lenient_policy_lets_delivery_through() {
        assert!(signature_failure(SignaturePolicy::Lenient, "paystack", "bad hmac").is_ok());
    }

    #[test]
    fn test_strict_policy_rejects_with_401() {
        let error = signature_failure(SignaturePolicy::Strict, "paystack", "bad hmac")
            .err()
            .map(|e| e.status());
        assert_eq!(error, Some(axum::http::StatusCode::UNAUTHORIZED));
    }
}
