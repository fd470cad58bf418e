//! Paystack webhook and verify redirect.

use super::{WebhookAck, acknowledge, frontend_url, ignore, signature_failure};
use crate::metrics;
use crate::server::state::{AppState, Backend};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
};
use comicvault_billing::adapters::PaystackEvent;
use comicvault_billing::adapters::paystack::verify_signature;
use comicvault_billing::constants::PAYSTACK_SIGNATURE_HEADER;
use comicvault_billing::providers::PaystackApi;
use comicvault_billing::{BillingError, ReconcileOutcome};
use comicvault_web::{CorrelationId, WebResult};
use serde::Deserialize;

const PROVIDER: &str = "paystack";

/// `POST /api/webhooks/paystack`
///
/// # Errors
///
/// - `x-paystack-signature` missing → 400
/// - Body not a Paystack envelope → 400
/// - Signature rejected under the strict policy → 401
pub async fn webhook<B: Backend>(
    State(state): State<AppState<B>>,
    correlation_id: CorrelationId,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<WebhookAck>> {
    let signature = headers
        .get(PAYSTACK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(BillingError::MissingSignature {
            header: PAYSTACK_SIGNATURE_HEADER,
        })?;

    let secret = &state.settings.paystack_secret;
    if secret.is_empty() {
        signature_failure(
            state.settings.signature_policy,
            PROVIDER,
            "PAYSTACK_SECRET_KEY is not configured",
        )?;
    } else if let Err(error) = verify_signature(secret, &body, signature) {
        signature_failure(state.settings.signature_policy, PROVIDER, &error.to_string())?;
    }

    let event = PaystackEvent::parse(&body)?;
    let name = event.name().to_string();

    tracing::debug!(
        correlation_id = %correlation_id.0,
        event = %name,
        "Paystack webhook received"
    );

    let Some(event) = event.into_payment_event() else {
        return Ok(Json(ignore(PROVIDER, name)));
    };

    let outcome = state.reconciliation.apply(event).await;
    Ok(Json(acknowledge(PROVIDER, name, &outcome)))
}

/// Query of the verify redirect.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Transaction reference Paystack appended to the callback URL.
    #[serde(default)]
    pub reference: Option<String>,
    /// Same value; Paystack sends both.
    #[serde(default)]
    pub trxref: Option<String>,
}

/// `GET /api/payments/paystack/verify?reference=…`
///
/// Where Paystack sends the buyer after checkout. Verifies the transaction
/// with Paystack, reconciles it like a `charge.success` webhook, then
/// redirects to `{app_url}/payment/success` or `{app_url}/payment/error`.
/// Never fails: every problem becomes an error redirect.
pub async fn verify<B: Backend>(
    State(state): State<AppState<B>>,
    Query(query): Query<VerifyQuery>,
) -> Redirect {
    let app_url = &state.settings.app_url;

    let Some(reference) = query
        .reference
        .or(query.trxref)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
    else {
        return Redirect::to(&frontend_url(
            app_url,
            "/payment/error",
            &[("status", "missing_reference")],
        ));
    };

    let charge = match state.paystack.verify_transaction(&reference).await {
        Ok(charge) => charge,
        Err(error) => {
            tracing::error!(reference = %reference, %error, "Paystack verification failed");
            return Redirect::to(&frontend_url(
                app_url,
                "/payment/error",
                &[("status", "verification_failed"), ("reference", reference.as_str())],
            ));
        }
    };

    if !charge.is_successful() {
        let status = charge.status.as_deref().unwrap_or("failed");
        tracing::warn!(reference = %reference, status, "Paystack transaction not successful");
        return Redirect::to(&frontend_url(
            app_url,
            "/payment/error",
            &[("status", status), ("reference", reference.as_str())],
        ));
    }

    let outcome = state.reconciliation.apply(charge.to_payment_event()).await;
    metrics::record_reconciliation(outcome.label());

    if outcome.is_settled() {
        Redirect::to(&frontend_url(
            app_url,
            "/payment/success",
            &[("status", "success"), ("reference", reference.as_str())],
        ))
    } else {
        let status = match outcome {
            ReconcileOutcome::Dropped { .. } => "unresolved",
            _ => "processing_failed",
        };
        Redirect::to(&frontend_url(
            app_url,
            "/payment/error",
            &[("status", status), ("reference", reference.as_str())],
        ))
    }
}
