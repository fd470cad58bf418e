//! Paystack webhook adapter.
//!
//! Paystack signs the raw body with HMAC-SHA512 keyed by the account secret key
//! and sends the hex digest in `x-paystack-signature`.

use crate::error::{BillingError, Result};
use crate::events::{CheckoutMetadata, EventKind, PaymentEvent};
use crate::state::ProviderRefs;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Verify `x-paystack-signature` against the raw body.
///
/// # Errors
///
/// Returns `BillingError::InvalidSignature` if the signature is not hex or
/// does not match.
pub fn verify_signature(secret_key: &str, body: &[u8], signature: &str) -> Result<()> {
    let expected = hex::decode(signature.trim()).map_err(|_| BillingError::InvalidSignature)?;

    let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())
        .map_err(|e| BillingError::Internal(format!("HMAC key rejected: {e}")))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| BillingError::InvalidSignature)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Paystack customer object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Customer {
    /// Customer code (`CUS_...`).
    #[serde(default)]
    pub customer_code: Option<String>,
}

/// Transaction object, sent in `charge.success` and returned by
/// `GET /transaction/verify/:reference`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChargeData {
    /// Transaction reference.
    pub reference: String,

    /// Transaction status (`success`, `failed`, `abandoned`, ...).
    #[serde(default)]
    pub status: Option<String>,

    /// Checkout metadata, in any shape Paystack hands back.
    #[serde(default)]
    pub metadata: Value,

    /// Paying customer.
    #[serde(default)]
    pub customer: Option<Customer>,
}

impl ChargeData {
    /// Whether Paystack reports the transaction as paid.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// Canonical capture event for this transaction.
    #[must_use]
    pub fn to_payment_event(&self) -> PaymentEvent {
        let metadata = CheckoutMetadata::from_value(&self.metadata);
        PaymentEvent {
            subject: metadata.subject(),
            kind: EventKind::CaptureCompleted,
            refs: ProviderRefs::Paystack {
                reference: Some(self.reference.clone()),
                subscription_code: None,
                customer_code: customer_code(self.customer.as_ref()),
            },
            plan: metadata.plan(),
        }
    }
}

/// Subscription object, sent in `subscription.*` events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionData {
    /// Subscription code (`SUB_...`).
    pub subscription_code: String,

    /// Subscribed customer.
    #[serde(default)]
    pub customer: Option<Customer>,

    /// Metadata, when the subscription was created with one.
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct SubscriptionRef {
    subscription_code: String,
}

/// Invoice object, sent in `invoice.*` events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceData {
    #[serde(default)]
    subscription: Option<SubscriptionRef>,

    /// Billed customer.
    #[serde(default)]
    pub customer: Option<Customer>,
}

/// Paystack webhook, one variant per modelled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaystackEvent {
    /// `charge.success`
    ChargeSuccess(ChargeData),
    /// `subscription.create`
    SubscriptionCreate(SubscriptionData),
    /// `subscription.enable`
    SubscriptionEnable(SubscriptionData),
    /// `subscription.disable`
    SubscriptionDisable(SubscriptionData),
    /// `invoice.payment_failed`
    InvoicePaymentFailed(InvoiceData),
    /// Any other event type; acknowledged and ignored.
    Unrecognized {
        /// Event name as sent.
        event: String,
    },
}

impl PaystackEvent {
    /// Parse a webhook body.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::MalformedPayload` if the envelope or the data
    /// object of a modelled event does not parse.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| BillingError::MalformedPayload(e.to_string()))?;

        let event = match envelope.event.as_str() {
            "charge.success" => Self::ChargeSuccess(data(envelope.data)?),
            "subscription.create" => Self::SubscriptionCreate(data(envelope.data)?),
            "subscription.enable" => Self::SubscriptionEnable(data(envelope.data)?),
            "subscription.disable" => Self::SubscriptionDisable(data(envelope.data)?),
            "invoice.payment_failed" => Self::InvoicePaymentFailed(data(envelope.data)?),
            _ => Self::Unrecognized {
                event: envelope.event,
            },
        };
        Ok(event)
    }

    /// Event name, for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ChargeSuccess(_) => "charge.success",
            Self::SubscriptionCreate(_) => "subscription.create",
            Self::SubscriptionEnable(_) => "subscription.enable",
            Self::SubscriptionDisable(_) => "subscription.disable",
            Self::InvoicePaymentFailed(_) => "invoice.payment_failed",
            Self::Unrecognized { event } => event,
        }
    }

    /// Canonical event, or `None` for unrecognised kinds.
    #[must_use]
    pub fn into_payment_event(self) -> Option<PaymentEvent> {
        let (kind, subscription) = match self {
            Self::ChargeSuccess(charge) => return Some(charge.to_payment_event()),
            Self::SubscriptionCreate(sub) => (EventKind::SubscriptionCreated, sub),
            Self::SubscriptionEnable(sub) => (EventKind::SubscriptionActivated, sub),
            Self::SubscriptionDisable(sub) => (EventKind::SubscriptionSuspended, sub),
            Self::InvoicePaymentFailed(invoice) => {
                return Some(PaymentEvent {
                    subject: None,
                    kind: EventKind::PaymentFailed,
                    refs: ProviderRefs::Paystack {
                        reference: None,
                        subscription_code: invoice.subscription.map(|s| s.subscription_code),
                        customer_code: customer_code(invoice.customer.as_ref()),
                    },
                    plan: None,
                });
            }
            Self::Unrecognized { .. } => return None,
        };

        let metadata = CheckoutMetadata::from_value(&subscription.metadata);
        Some(PaymentEvent {
            subject: metadata.subject(),
            kind,
            refs: ProviderRefs::Paystack {
                reference: None,
                subscription_code: Some(subscription.subscription_code),
                customer_code: customer_code(subscription.customer.as_ref()),
            },
            plan: metadata.plan(),
        })
    }
}

fn data<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| BillingError::MalformedPayload(e.to_string()))
}

fn customer_code(customer: Option<&Customer>) -> Option<String> {
    customer.and_then(|c| c.customer_code.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::SubjectRef;
    use crate::state::{PlanType, UserId};
    use serde_json::json;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign("sk_test_secret", body);

        assert!(verify_signature("sk_test_secret", body, &signature).is_ok());
        assert_eq!(
            verify_signature("sk_other", body, &signature),
            Err(BillingError::InvalidSignature)
        );
        assert_eq!(
            verify_signature("sk_test_secret", body, "not-hex"),
            Err(BillingError::InvalidSignature)
        );
    }

    #[test]
    fn test_charge_success_normalises() {
        let user = UserId::new();
        let body = json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_abc",
                "status": "success",
                "metadata": { "user_id": user.to_string(), "plan_type": "daypass", "plan_name": "Day Pass" },
                "customer": { "customer_code": "CUS_xyz", "email": "reader@example.com" }
            }
        });

        let event = PaystackEvent::parse(body.to_string().as_bytes())
            .unwrap()
            .into_payment_event()
            .unwrap();

        assert_eq!(event.kind, EventKind::CaptureCompleted);
        assert_eq!(event.subject, Some(SubjectRef::User(user)));
        assert_eq!(event.plan, Some(PlanType::DayPass));
        assert_eq!(
            event.refs,
            ProviderRefs::Paystack {
                reference: Some("ref_abc".to_string()),
                subscription_code: None,
                customer_code: Some("CUS_xyz".to_string()),
            }
        );
    }

    #[test]
    fn test_charge_with_empty_string_metadata() {
        let body = json!({
            "event": "charge.success",
            "data": { "reference": "ref_1", "status": "success", "metadata": "" }
        });
        let event = PaystackEvent::parse(body.to_string().as_bytes())
            .unwrap()
            .into_payment_event()
            .unwrap();
        assert_eq!(event.subject, None);
    }

    #[test]
    fn test_subscription_disable_is_suspension() {
        let body = json!({
            "event": "subscription.disable",
            "data": { "subscription_code": "SUB_1", "customer": { "customer_code": "CUS_1" } }
        });
        let event = PaystackEvent::parse(body.to_string().as_bytes())
            .unwrap()
            .into_payment_event()
            .unwrap();
        assert_eq!(event.kind, EventKind::SubscriptionSuspended);
        assert_eq!(event.refs.paystack_subscription_code(), Some("SUB_1"));
    }

    #[test]
    fn test_invoice_failure() {
        let body = json!({
            "event": "invoice.payment_failed",
            "data": { "subscription": { "subscription_code": "SUB_9" }, "customer": {} }
        });
        let event = PaystackEvent::parse(body.to_string().as_bytes())
            .unwrap()
            .into_payment_event()
            .unwrap();
        assert_eq!(event.kind, EventKind::PaymentFailed);
    }

    #[test]
    fn test_unrecognized_and_malformed() {
        let unknown = PaystackEvent::parse(br#"{"event":"transfer.success","data":{}}"#).unwrap();
        assert_eq!(unknown.name(), "transfer.success");
        assert!(unknown.into_payment_event().is_none());

        assert!(matches!(
            PaystackEvent::parse(b"{not json"),
            Err(BillingError::MalformedPayload(_))
        ));
        assert!(matches!(
            PaystackEvent::parse(br#"{"event":"charge.success","data":{}}"#),
            Err(BillingError::MalformedPayload(_))
        ));
    }
}
