//! PayPal webhooks.
//!
//! `POST /api/webhooks/paypal/capture` receives one-time captures (day
//! passes), `POST /api/webhooks/paypal/subscription` the subscription
//! lifecycle. Both share one pipeline: transmission headers, envelope parse,
//! signature verification through PayPal, normalisation, reconciliation.

use super::{WebhookAck, acknowledge, ignore, signature_failure};
use crate::server::state::{AppState, Backend};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use comicvault_billing::BillingError;
use comicvault_billing::adapters::PayPalWebhook;
use comicvault_billing::constants::paypal_headers;
use comicvault_billing::providers::{PayPalApi, WebhookTransmission};
use comicvault_web::{CorrelationId, WebResult};

const PROVIDER: &str = "paypal";
const CAPTURE_ROUTE: &str = "capture";

/// Capture webhook.
///
/// # Errors
///
/// - Transmission headers missing → 400
/// - Body not a PayPal envelope → 400
/// - Signature rejected under the strict policy → 401
pub async fn capture_webhook<B: Backend>(
    State(state): State<AppState<B>>,
    correlation_id: CorrelationId,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<WebhookAck>> {
    handle_webhook(&state, CAPTURE_ROUTE, correlation_id, &headers, &body).await
}

/// Subscription webhook.
///
/// # Errors
///
/// Same as [`capture_webhook`].
pub async fn subscription_webhook<B: Backend>(
    State(state): State<AppState<B>>,
    correlation_id: CorrelationId,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<WebhookAck>> {
    handle_webhook(&state, "subscription", correlation_id, &headers, &body).await
}

async fn handle_webhook<B: Backend>(
    state: &AppState<B>,
    route: &'static str,
    correlation_id: CorrelationId,
    headers: &HeaderMap,
    body: &[u8],
) -> WebResult<Json<WebhookAck>> {
    let transmission = transmission_from(headers)?;
    let webhook = PayPalWebhook::parse(body)?;
    let event_type = webhook.event.event_type().to_string();

    tracing::debug!(
        correlation_id = %correlation_id.0,
        route,
        webhook_id = ?webhook.id,
        event = %event_type,
        "PayPal webhook received"
    );

    match state.paypal.verify_webhook_signature(&transmission, body).await {
        Ok(true) => {}
        Ok(false) => {
            signature_failure(state.settings.signature_policy, PROVIDER, "PayPal answered FAILURE")?;
        }
        Err(error) => {
            signature_failure(state.settings.signature_policy, PROVIDER, &error.to_string())?;
        }
    }

    let is_capture = webhook.event.is_capture();
    let Some(event) = webhook.event.into_payment_event() else {
        return Ok(Json(ignore(PROVIDER, event_type)));
    };

    if is_capture != (route == CAPTURE_ROUTE) {
        tracing::warn!(
            route,
            event = %event_type,
            "PayPal event delivered to the other webhook route; reconciling anyway"
        );
    }

    let outcome = state.reconciliation.apply(event).await;
    Ok(Json(acknowledge(PROVIDER, event_type, &outcome)))
}

fn transmission_from(headers: &HeaderMap) -> Result<WebhookTransmission, BillingError> {
    let header = |name: &'static str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(BillingError::MissingSignature { header: name })
    };

    Ok(WebhookTransmission {
        transmission_id: header(paypal_headers::TRANSMISSION_ID)?,
        transmission_time: header(paypal_headers::TRANSMISSION_TIME)?,
        transmission_sig: header(paypal_headers::TRANSMISSION_SIG)?,
        cert_url: header(paypal_headers::CERT_URL)?,
        auth_algo: header(paypal_headers::AUTH_ALGO)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_transmission_header() {
        let mut headers = HeaderMap::new();
        headers.insert(paypal_headers::TRANSMISSION_ID, HeaderValue::from_static("tid"));

        let error = transmission_from(&headers).unwrap_err();
        assert_eq!(
            error,
            BillingError::MissingSignature {
                header: paypal_headers::TRANSMISSION_TIME
            }
        );
    }

    #[test]
    fn test_transmission_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(paypal_headers::TRANSMISSION_ID, HeaderValue::from_static("tid"));
        headers.insert(paypal_headers::TRANSMISSION_TIME, HeaderValue::from_static("now"));
        headers.insert(paypal_headers::TRANSMISSION_SIG, HeaderValue::from_static("sig"));
        headers.insert(paypal_headers::CERT_URL, HeaderValue::from_static("https://cert"));
        headers.insert(paypal_headers::AUTH_ALGO, HeaderValue::from_static("SHA256withRSA"));

        let transmission = transmission_from(&headers).unwrap();
        assert_eq!(transmission.transmission_sig, "sig");
        assert_eq!(transmission.auth_algo, "SHA256withRSA");
    }
}
