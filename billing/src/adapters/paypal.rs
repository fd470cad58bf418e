//! PayPal webhook adapter.
//!
//! PayPal webhooks are authenticated out of band through the
//! verify-webhook-signature API (see [`PayPalApi`](crate::providers::PayPalApi)),
//! so this module only parses.

use crate::error::{BillingError, Result};
use crate::events::{CheckoutMetadata, EventKind, PaymentEvent};
use crate::state::ProviderRefs;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<String>,
    event_type: String,
    #[serde(default)]
    resource: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct RelatedIds {
    #[serde(default)]
    order_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct SupplementaryData {
    #[serde(default)]
    related_ids: Option<RelatedIds>,
}

/// Capture resource of `PAYMENT.CAPTURE.COMPLETED`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptureResource {
    /// Capture id.
    pub id: String,

    /// Checkout metadata as set on the purchase unit.
    #[serde(default)]
    pub custom_id: Option<String>,

    #[serde(default)]
    supplementary_data: Option<SupplementaryData>,
}

impl CaptureResource {
    /// Order the capture belongs to, falling back to the capture id.
    #[must_use]
    pub fn order_id(&self) -> String {
        self.supplementary_data
            .as_ref()
            .and_then(|data| data.related_ids.as_ref())
            .and_then(|ids| ids.order_id.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Subscription resource of `BILLING.SUBSCRIPTION.*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionResource {
    /// Subscription id (`I-...`).
    pub id: String,

    /// Plain user id or JSON metadata.
    #[serde(default)]
    pub custom_id: Option<String>,

    /// Billing plan id.
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// PayPal webhook, one variant per modelled event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayPalEvent {
    /// `PAYMENT.CAPTURE.COMPLETED`
    CaptureCompleted(CaptureResource),
    /// `BILLING.SUBSCRIPTION.CREATED`
    SubscriptionCreated(SubscriptionResource),
    /// `BILLING.SUBSCRIPTION.ACTIVATED`
    SubscriptionActivated(SubscriptionResource),
    /// `BILLING.SUBSCRIPTION.CANCELLED`
    SubscriptionCancelled(SubscriptionResource),
    /// `BILLING.SUBSCRIPTION.SUSPENDED`
    SubscriptionSuspended(SubscriptionResource),
    /// `BILLING.SUBSCRIPTION.EXPIRED`
    SubscriptionExpired(SubscriptionResource),
    /// `BILLING.SUBSCRIPTION.PAYMENT.FAILED`
    PaymentFailed(SubscriptionResource),
    /// Any other event type; acknowledged and ignored.
    Unrecognized {
        /// Event type as sent.
        event_type: String,
    },
}

/// A parsed PayPal webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalWebhook {
    /// Webhook event id (`WH-...`).
    pub id: Option<String>,
    /// Typed event.
    pub event: PayPalEvent,
}

impl PayPalWebhook {
    /// Parse a webhook body.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::MalformedPayload` if the envelope or the resource
    /// of a modelled event type does not parse.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| BillingError::MalformedPayload(e.to_string()))?;

        let resource = envelope.resource;
        let event = match envelope.event_type.as_str() {
            "PAYMENT.CAPTURE.COMPLETED" => PayPalEvent::CaptureCompleted(resource_of(resource)?),
            "BILLING.SUBSCRIPTION.CREATED" => {
                PayPalEvent::SubscriptionCreated(resource_of(resource)?)
            }
            "BILLING.SUBSCRIPTION.ACTIVATED" => {
                PayPalEvent::SubscriptionActivated(resource_of(resource)?)
            }
            "BILLING.SUBSCRIPTION.CANCELLED" => {
                PayPalEvent::SubscriptionCancelled(resource_of(resource)?)
            }
            "BILLING.SUBSCRIPTION.SUSPENDED" => {
                PayPalEvent::SubscriptionSuspended(resource_of(resource)?)
            }
            "BILLING.SUBSCRIPTION.EXPIRED" => {
                PayPalEvent::SubscriptionExpired(resource_of(resource)?)
            }
            "BILLING.SUBSCRIPTION.PAYMENT.FAILED" => {
                PayPalEvent::PaymentFailed(resource_of(resource)?)
            }
            _ => PayPalEvent::Unrecognized {
                event_type: envelope.event_type,
            },
        };

        Ok(Self {
            id: envelope.id,
            event,
        })
    }
}

impl PayPalEvent {
    /// Whether this is a one-time capture (as opposed to a subscription event).
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        matches!(self, Self::CaptureCompleted(_))
    }

    /// Event type, for logs.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::CaptureCompleted(_) => "PAYMENT.CAPTURE.COMPLETED",
            Self::SubscriptionCreated(_) => "BILLING.SUBSCRIPTION.CREATED",
            Self::SubscriptionActivated(_) => "BILLING.SUBSCRIPTION.ACTIVATED",
            Self::SubscriptionCancelled(_) => "BILLING.SUBSCRIPTION.CANCELLED",
            Self::SubscriptionSuspended(_) => "BILLING.SUBSCRIPTION.SUSPENDED",
            Self::SubscriptionExpired(_) => "BILLING.SUBSCRIPTION.EXPIRED",
            Self::PaymentFailed(_) => "BILLING.SUBSCRIPTION.PAYMENT.FAILED",
            Self::Unrecognized { event_type } => event_type,
        }
    }

    /// Canonical event, or `None` for unrecognised types.
    #[must_use]
    pub fn into_payment_event(self) -> Option<PaymentEvent> {
        let (kind, subscription) = match self {
            Self::CaptureCompleted(capture) => {
                let metadata = capture
                    .custom_id
                    .as_deref()
                    .map(CheckoutMetadata::from_custom_id)
                    .unwrap_or_default();
                return Some(PaymentEvent {
                    subject: metadata.subject(),
                    kind: EventKind::CaptureCompleted,
                    refs: ProviderRefs::PayPal {
                        order_id: Some(capture.order_id()),
                        subscription_id: None,
                    },
                    plan: metadata.plan(),
                });
            }
            Self::SubscriptionCreated(sub) => (EventKind::SubscriptionCreated, sub),
            Self::SubscriptionActivated(sub) => (EventKind::SubscriptionActivated, sub),
            Self::SubscriptionCancelled(sub) => (EventKind::SubscriptionCancelled, sub),
            Self::SubscriptionSuspended(sub) => (EventKind::SubscriptionSuspended, sub),
            Self::SubscriptionExpired(sub) => (EventKind::SubscriptionExpired, sub),
            Self::PaymentFailed(sub) => (EventKind::PaymentFailed, sub),
            Self::Unrecognized { .. } => return None,
        };

        let metadata = subscription
            .custom_id
            .as_deref()
            .map(CheckoutMetadata::from_custom_id)
            .unwrap_or_default();
        Some(PaymentEvent {
            subject: metadata.subject(),
            kind,
            refs: ProviderRefs::PayPal {
                order_id: None,
                subscription_id: Some(subscription.id),
            },
            plan: metadata.plan(),
        })
    }
}

fn resource_of<T: for<'de> Deserialize<'de>>(resource: Value) -> Result<T> {
    serde_json::from_value(resource).map_err(|e| BillingError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::SubjectRef;
    use crate::state::{AnonymousSessionId, PlanType, UserId};
    use serde_json::json;

    #[test]
    fn test_anonymous_capture() {
        let session = AnonymousSessionId::new();
        let custom_id = json!({
            "session_id": session.to_string(),
            "is_anonymous": true,
            "plan_type": "daypass"
        })
        .to_string();
        let body = json!({
            "id": "WH-1",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "CAPTURE-1",
                "custom_id": custom_id,
                "supplementary_data": { "related_ids": { "order_id": "ORDER-1" } }
            }
        });

        let webhook = PayPalWebhook::parse(body.to_string().as_bytes()).unwrap();
        assert_eq!(webhook.id.as_deref(), Some("WH-1"));
        assert!(webhook.event.is_capture());

        let event = webhook.event.into_payment_event().unwrap();
        assert_eq!(event.subject, Some(SubjectRef::Session(session)));
        assert_eq!(event.plan, Some(PlanType::DayPass));
        assert_eq!(event.refs.transaction_ref(), Some("ORDER-1"));
    }

    #[test]
    fn test_capture_without_order_falls_back_to_capture_id() {
        let body = json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": { "id": "CAPTURE-2" }
        });
        let event = PayPalWebhook::parse(body.to_string().as_bytes())
            .unwrap()
            .event
            .into_payment_event()
            .unwrap();
        assert_eq!(event.refs.transaction_ref(), Some("CAPTURE-2"));
        assert_eq!(event.subject, None);
    }

    #[test]
    fn test_subscription_with_plain_user_id() {
        let user = UserId::new();
        let body = json!({
            "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
            "resource": { "id": "I-ABC", "custom_id": user.to_string(), "plan_id": "P-1" }
        });
        let event = PayPalWebhook::parse(body.to_string().as_bytes())
            .unwrap()
            .event
            .into_payment_event()
            .unwrap();

        assert_eq!(event.kind, EventKind::SubscriptionActivated);
        assert_eq!(event.subject, Some(SubjectRef::User(user)));
        assert_eq!(
            event.refs,
            ProviderRefs::PayPal {
                order_id: None,
                subscription_id: Some("I-ABC".to_string()),
            }
        );
    }

    #[test]
    fn test_lifecycle_kinds() {
        let cases = [
            ("BILLING.SUBSCRIPTION.CREATED", EventKind::SubscriptionCreated),
            ("BILLING.SUBSCRIPTION.CANCELLED", EventKind::SubscriptionCancelled),
            ("BILLING.SUBSCRIPTION.SUSPENDED", EventKind::SubscriptionSuspended),
            ("BILLING.SUBSCRIPTION.EXPIRED", EventKind::SubscriptionExpired),
            ("BILLING.SUBSCRIPTION.PAYMENT.FAILED", EventKind::PaymentFailed),
        ];
        for (event_type, kind) in cases {
            let body = json!({ "event_type": event_type, "resource": { "id": "I-1" } });
            let event = PayPalWebhook::parse(body.to_string().as_bytes()).unwrap().event;
            assert_eq!(event.event_type(), event_type);
            assert_eq!(event.into_payment_event().unwrap().kind, kind);
        }
    }

    #[test]
    fn test_unrecognized_and_malformed() {
        let body = json!({ "event_type": "CUSTOMER.DISPUTE.CREATED", "resource": {} });
        let webhook = PayPalWebhook::parse(body.to_string().as_bytes()).unwrap();
        assert!(webhook.event.into_payment_event().is_none());

        assert!(matches!(
            PayPalWebhook::parse(br#"{"resource":{}}"#),
            Err(BillingError::MalformedPayload(_))
        ));
        assert!(matches!(
            PayPalWebhook::parse(br#"{"event_type":"BILLING.SUBSCRIPTION.CREATED","resource":{}}"#),
            Err(BillingError::MalformedPayload(_))
        ));
    }
}
