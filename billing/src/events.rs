//! Canonical payment events.
//!
//! Both provider adapters normalise their webhooks into [`PaymentEvent`].
//! Events live only for the duration of a request.

use crate::state::{AnonymousSessionId, PaymentProvider, PlanType, ProviderRefs, UserId};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Who a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectRef {
    /// Signed-in user.
    User(UserId),
    /// Anonymous browser session.
    Session(AnonymousSessionId),
}

/// Normalised event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// One-time capture or charge completed.
    CaptureCompleted,
    /// Subscription created.
    SubscriptionCreated,
    /// Subscription activated or re-enabled.
    SubscriptionActivated,
    /// Subscription cancelled.
    SubscriptionCancelled,
    /// Subscription suspended or disabled.
    SubscriptionSuspended,
    /// Subscription expired.
    SubscriptionExpired,
    /// Recurring payment failed.
    PaymentFailed,
}

impl EventKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CaptureCompleted => "capture_completed",
            Self::SubscriptionCreated => "subscription_created",
            Self::SubscriptionActivated => "subscription_activated",
            Self::SubscriptionCancelled => "subscription_cancelled",
            Self::SubscriptionSuspended => "subscription_suspended",
            Self::SubscriptionExpired => "subscription_expired",
            Self::PaymentFailed => "payment_failed",
        }
    }
}

/// A provider webhook after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Subject named explicitly in the payment metadata, if any.
    pub subject: Option<SubjectRef>,

    /// What happened.
    pub kind: EventKind,

    /// Correlation ids carried by the payload. Also identifies the provider.
    pub refs: ProviderRefs,

    /// Plan declared in the checkout metadata.
    pub plan: Option<PlanType>,
}

impl PaymentEvent {
    /// Provider that sent the event.
    #[must_use]
    pub const fn provider(&self) -> PaymentProvider {
        self.refs.provider()
    }
}

/// Checkout metadata attached to a payment.
///
/// PayPal carries it in `custom_id` (a JSON string or a bare user id), Paystack
/// in `metadata` (an object, a JSON string, or an empty string).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutMetadata {
    /// Signed-in user id.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Anonymous session id.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Whether the purchase was made without an account.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_anonymous: bool,

    /// Declared plan (`daypass`, `member`).
    #[serde(default)]
    pub plan_type: Option<String>,

    /// Human-readable plan name.
    #[serde(default)]
    pub plan_name: Option<String>,
}

impl CheckoutMetadata {
    /// Normalise a metadata value of any of the shapes the providers send.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::deserialize(value).unwrap_or_default(),
            Value::String(raw) => Self::from_custom_id(raw),
            _ => Self::default(),
        }
    }

    /// Parse a PayPal `custom_id`: JSON metadata or a bare user id.
    #[must_use]
    pub fn from_custom_id(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Self::from_value(&value),
            _ => Self {
                user_id: Some(raw.to_string()),
                ..Self::default()
            },
        }
    }

    /// Declared plan, if recognised.
    #[must_use]
    pub fn plan(&self) -> Option<PlanType> {
        self.plan_type.as_deref().and_then(PlanType::from_metadata)
    }

    /// Explicit subject named by the metadata.
    ///
    /// Anonymous purchases resolve to the session; otherwise the user id wins
    /// over a stray session id. Ids that do not parse are ignored.
    #[must_use]
    pub fn subject(&self) -> Option<SubjectRef> {
        let session = self
            .session_id
            .as_deref()
            .and_then(|id| AnonymousSessionId::parse(id).ok())
            .map(SubjectRef::Session);
        let user = self
            .user_id
            .as_deref()
            .and_then(|id| UserId::parse(id).ok())
            .map(SubjectRef::User);

        if self.is_anonymous {
            session.or(user)
        } else {
            user.or(session)
        }
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(s) => matches!(s.trim(), "true" | "1" | "yes"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}
