//! Entitlement state types.
//!
//! These are transient, per-request views of what the entitlement store holds.
//! All types are `Clone` so the reconciler can work on owned values.

use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Stable identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a user id from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidIdentifier` if `value` is not a UUID.
    pub fn parse(value: &str) -> Result<Self> {
        uuid::Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| BillingError::InvalidIdentifier(format!("user id: {value}")))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ephemeral identifier of an anonymous browser session.
///
/// Carried in the anonymous session cookie and in payment metadata for
/// purchases made before sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnonymousSessionId(pub uuid::Uuid);

impl AnonymousSessionId {
    /// Generate a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a session id from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidIdentifier` if `value` is not a UUID.
    pub fn parse(value: &str) -> Result<Self> {
        uuid::Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| BillingError::InvalidIdentifier(format!("session id: {value}")))
    }
}

impl Default for AnonymousSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnonymousSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Enumerations
// ═══════════════════════════════════════════════════════════════════════

/// Access tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No paid access.
    Free,
    /// Recurring subscription.
    Member,
    /// Short one-time pass.
    DayPass,
}

impl Tier {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Member => "member",
            Self::DayPass => "daypass",
        }
    }
}

impl FromStr for Tier {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "free" => Ok(Self::Free),
            "member" => Ok(Self::Member),
            "daypass" => Ok(Self::DayPass),
            other => Err(BillingError::InvalidIdentifier(format!("tier: {other}"))),
        }
    }
}

/// Entitlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    /// Never paid.
    Free,
    /// Paid and within its window.
    Active,
    /// Cancelled or suspended by the provider.
    Cancelled,
    /// Ended by the provider.
    Expired,
}

impl EntitlementStatus {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for EntitlementStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "free" => Ok(Self::Free),
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(BillingError::InvalidIdentifier(format!("status: {other}"))),
        }
    }
}

/// Payment provider that produced the current entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// No provider (free account).
    None,
    /// PayPal orders and billing subscriptions.
    PayPal,
    /// Paystack charges and subscriptions.
    Paystack,
}

impl PaymentProvider {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PayPal => "paypal",
            Self::Paystack => "paystack",
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "paypal" => Ok(Self::PayPal),
            "paystack" => Ok(Self::Paystack),
            other => Err(BillingError::InvalidIdentifier(format!("provider: {other}"))),
        }
    }
}

/// Plan purchased, as declared in checkout metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    /// One-time day pass.
    DayPass,
    /// Recurring membership.
    Member,
}

impl PlanType {
    /// Lenient parse of the free-form `plan_type` metadata value.
    #[must_use]
    pub fn from_metadata(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daypass" | "day_pass" | "day-pass" => Some(Self::DayPass),
            "member" | "membership" | "subscription" | "weekly" => Some(Self::Member),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Provider Correlation
// ═══════════════════════════════════════════════════════════════════════

/// Correlation identifiers of the provider that owns an entitlement.
///
/// One variant per provider, so a tuple can never carry two providers' refs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderRefs {
    /// No provider.
    #[default]
    None,

    /// PayPal identifiers.
    PayPal {
        /// Checkout order id (one-time captures).
        order_id: Option<String>,
        /// Billing subscription id (`I-...`).
        subscription_id: Option<String>,
    },

    /// Paystack identifiers.
    Paystack {
        /// Transaction reference.
        reference: Option<String>,
        /// Subscription code (`SUB_...`).
        subscription_code: Option<String>,
        /// Customer code (`CUS_...`).
        customer_code: Option<String>,
    },
}

impl ProviderRefs {
    /// Refs for a single one-time transaction.
    #[must_use]
    pub fn from_transaction(provider: PaymentProvider, transaction_ref: Option<String>) -> Self {
        match provider {
            PaymentProvider::None => Self::None,
            PaymentProvider::PayPal => Self::PayPal {
                order_id: transaction_ref,
                subscription_id: None,
            },
            PaymentProvider::Paystack => Self::Paystack {
                reference: transaction_ref,
                subscription_code: None,
                customer_code: None,
            },
        }
    }

    /// Provider owning these refs.
    #[must_use]
    pub const fn provider(&self) -> PaymentProvider {
        match self {
            Self::None => PaymentProvider::None,
            Self::PayPal { .. } => PaymentProvider::PayPal,
            Self::Paystack { .. } => PaymentProvider::Paystack,
        }
    }

    /// One-time transaction reference (PayPal order id or Paystack reference).
    #[must_use]
    pub fn transaction_ref(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::PayPal { order_id, .. } => order_id.as_deref(),
            Self::Paystack { reference, .. } => reference.as_deref(),
        }
    }

    /// Paystack subscription code, if any.
    #[must_use]
    pub fn paystack_subscription_code(&self) -> Option<&str> {
        match self {
            Self::Paystack { subscription_code, .. } => subscription_code.as_deref(),
            _ => None,
        }
    }

    /// Fill refs missing from `self` with the same provider's refs in `previous`.
    ///
    /// Refs of a different provider are discarded.
    #[must_use]
    pub fn merged_with(self, previous: &Self) -> Self {
        match (self, previous) {
            (
                Self::PayPal { order_id, subscription_id },
                Self::PayPal { order_id: prev_order, subscription_id: prev_sub },
            ) => Self::PayPal {
                order_id: order_id.or_else(|| prev_order.clone()),
                subscription_id: subscription_id.or_else(|| prev_sub.clone()),
            },
            (
                Self::Paystack { reference, subscription_code, customer_code },
                Self::Paystack {
                    reference: prev_ref,
                    subscription_code: prev_sub,
                    customer_code: prev_cus,
                },
            ) => Self::Paystack {
                reference: reference.or_else(|| prev_ref.clone()),
                subscription_code: subscription_code.or_else(|| prev_sub.clone()),
                customer_code: customer_code.or_else(|| prev_cus.clone()),
            },
            (refs, _) => refs,
        }
    }

    /// Keys usable to find the owning user, in resolution order:
    /// transaction reference, subscription, customer.
    #[must_use]
    pub fn lookup_keys(&self) -> Vec<ProviderReference> {
        let mut keys = Vec::new();
        match self {
            Self::None => {}
            Self::PayPal { order_id, subscription_id } => {
                if let Some(id) = order_id {
                    keys.push(ProviderReference::PayPalOrder(id.clone()));
                }
                if let Some(id) = subscription_id {
                    keys.push(ProviderReference::PayPalSubscription(id.clone()));
                }
            }
            Self::Paystack { reference, subscription_code, customer_code } => {
                if let Some(r) = reference {
                    keys.push(ProviderReference::PaystackReference(r.clone()));
                }
                if let Some(code) = subscription_code {
                    keys.push(ProviderReference::PaystackSubscription(code.clone()));
                }
                if let Some(code) = customer_code {
                    keys.push(ProviderReference::PaystackCustomer(code.clone()));
                }
            }
        }
        keys
    }
}

/// A single stored correlation id, used for reverse lookup of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderReference {
    /// PayPal order id.
    PayPalOrder(String),
    /// PayPal billing subscription id.
    PayPalSubscription(String),
    /// Paystack transaction reference.
    PaystackReference(String),
    /// Paystack subscription code.
    PaystackSubscription(String),
    /// Paystack customer code.
    PaystackCustomer(String),
}

impl ProviderReference {
    /// Column holding this reference in the `profiles` table.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::PayPalOrder(_) => "paypal_order_id",
            Self::PayPalSubscription(_) => "paypal_subscription_id",
            Self::PaystackReference(_) => "paystack_reference",
            Self::PaystackSubscription(_) => "paystack_subscription_code",
            Self::PaystackCustomer(_) => "paystack_customer_code",
        }
    }

    /// The raw identifier.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::PayPalOrder(v)
            | Self::PayPalSubscription(v)
            | Self::PaystackReference(v)
            | Self::PaystackSubscription(v)
            | Self::PaystackCustomer(v) => v,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Core State Types
// ═══════════════════════════════════════════════════════════════════════

/// A subject's current access.
///
/// Always written as a whole; the store never receives partial patches.
///
/// # Examples
///
/// ```
/// # use comicvault_billing::state::{Entitlement, Tier, EntitlementStatus};
/// let free = Entitlement::default();
/// assert_eq!(free.tier, Tier::Free);
/// assert_eq!(free.status, EntitlementStatus::Free);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Access tier.
    pub tier: Tier,

    /// Lifecycle status.
    pub status: EntitlementStatus,

    /// End of access; `None` means no expiry is tracked.
    pub expires_at: Option<DateTime<Utc>>,

    /// Correlation ids of the owning provider.
    pub refs: ProviderRefs,
}

impl Default for Entitlement {
    fn default() -> Self {
        Self {
            tier: Tier::Free,
            status: EntitlementStatus::Free,
            expires_at: None,
            refs: ProviderRefs::None,
        }
    }
}

impl Entitlement {
    /// Provider that produced this entitlement.
    #[must_use]
    pub const fn payment_provider(&self) -> PaymentProvider {
        self.refs.provider()
    }

    /// Whether this entitlement grants paid access at `now`.
    ///
    /// An `active` row past its expiry does not grant access even though the
    /// store still says `active`.
    #[must_use]
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        self.tier != Tier::Free
            && self.status == EntitlementStatus::Active
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Check the tuple invariants as of `now`.
    #[must_use]
    pub fn upholds_invariants(&self, now: DateTime<Utc>) -> bool {
        let active_ok = self.status != EntitlementStatus::Active
            || self.tier == Tier::Free
            || self.expires_at.is_some_and(|expires_at| expires_at > now);
        let free_ok = self.tier != Tier::Free
            || matches!(
                self.status,
                EntitlementStatus::Free | EntitlementStatus::Expired | EntitlementStatus::Cancelled
            );
        active_ok && free_ok
    }
}

/// Anonymous day pass, keyed by session id.
///
/// Never deleted: merging sets `user_id` and the row stops granting access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPass {
    /// Session the pass was bought under.
    pub session_id: AnonymousSessionId,

    /// End of access.
    pub expires_at: DateTime<Utc>,

    /// Provider that captured the payment.
    pub payment_provider: PaymentProvider,

    /// Provider transaction reference.
    pub transaction_ref: Option<String>,

    /// Set once merged onto a user account.
    pub user_id: Option<UserId>,

    /// First capture timestamp.
    pub created_at: DateTime<Utc>,
}

impl DayPass {
    /// Whether this pass has been transferred to an account.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether the pass still grants anonymous access at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_merged() && self.expires_at > now
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_enum_round_trip_through_db_strings() {
        for tier in [Tier::Free, Tier::Member, Tier::DayPass] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        for provider in [PaymentProvider::None, PaymentProvider::PayPal, PaymentProvider::Paystack] {
            assert_eq!(provider.as_str().parse::<PaymentProvider>().unwrap(), provider);
        }
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_plan_type_from_metadata() {
        assert_eq!(PlanType::from_metadata("daypass"), Some(PlanType::DayPass));
        assert_eq!(PlanType::from_metadata("Day_Pass"), Some(PlanType::DayPass));
        assert_eq!(PlanType::from_metadata("member"), Some(PlanType::Member));
        assert_eq!(PlanType::from_metadata("lifetime"), None);
    }

    #[test]
    fn test_merged_with_keeps_same_provider_refs() {
        let previous = ProviderRefs::Paystack {
            reference: Some("ref_1".to_string()),
            subscription_code: Some("SUB_1".to_string()),
            customer_code: Some("CUS_1".to_string()),
        };
        let incoming = ProviderRefs::Paystack {
            reference: Some("ref_2".to_string()),
            subscription_code: None,
            customer_code: None,
        };

        let merged = incoming.merged_with(&previous);
        assert_eq!(
            merged,
            ProviderRefs::Paystack {
                reference: Some("ref_2".to_string()),
                subscription_code: Some("SUB_1".to_string()),
                customer_code: Some("CUS_1".to_string()),
            }
        );
    }

    #[test]
    fn test_merged_with_drops_other_provider_refs() {
        let previous = ProviderRefs::PayPal {
            order_id: Some("ORDER".to_string()),
            subscription_id: Some("I-SUB".to_string()),
        };
        let incoming = ProviderRefs::from_transaction(PaymentProvider::Paystack, Some("ref".to_string()));

        let merged = incoming.clone().merged_with(&previous);
        assert_eq!(merged, incoming);
        assert_eq!(merged.provider(), PaymentProvider::Paystack);
    }

    #[test]
    fn test_lookup_keys_order() {
        let refs = ProviderRefs::Paystack {
            reference: Some("ref".to_string()),
            subscription_code: Some("SUB".to_string()),
            customer_code: Some("CUS".to_string()),
        };
        let columns: Vec<_> = refs.lookup_keys().iter().map(ProviderReference::column).collect();
        assert_eq!(
            columns,
            vec!["paystack_reference", "paystack_subscription_code", "paystack_customer_code"]
        );
    }

    #[test]
    fn test_grants_access_respects_expiry() {
        let now = Utc::now();
        let mut entitlement = Entitlement {
            tier: Tier::DayPass,
            status: EntitlementStatus::Active,
            expires_at: Some(now + Duration::hours(1)),
            refs: ProviderRefs::None,
        };
        assert!(entitlement.grants_access_at(now));

        entitlement.expires_at = Some(now - Duration::seconds(1));
        assert!(!entitlement.grants_access_at(now));
        assert!(!entitlement.upholds_invariants(now));
    }

    #[test]
    fn test_day_pass_merged_is_inert() {
        let now = Utc::now();
        let mut pass = DayPass {
            session_id: AnonymousSessionId::new(),
            expires_at: now + Duration::hours(2),
            payment_provider: PaymentProvider::PayPal,
            transaction_ref: Some("ORDER-1".to_string()),
            user_id: None,
            created_at: now,
        };
        assert!(pass.is_active_at(now));

        pass.user_id = Some(UserId::new());
        assert!(!pass.is_active_at(now));
    }
}
