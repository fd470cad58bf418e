//! Subscription reconciler.
//!
//! Pure computation of a subject's next entitlement from a canonical payment
//! event and the currently stored entitlement. No I/O happens here; the
//! [`ReconciliationService`](crate::reconciliation::ReconciliationService)
//! loads the current state and persists the result.
//!
//! # Transition table
//!
//! | event                  | tier                                   | status      | expires_at        |
//! |------------------------|----------------------------------------|-------------|-------------------|
//! | capture completed      | `daypass` (`member` on renewal)        | `active`    | now + duration    |
//! | subscription created   | `member`                               | `active`    | now + 7d          |
//! | subscription activated | `member` if already member, else pass  | `active`    | now + duration    |
//! | cancelled / suspended  | unchanged (`member` if free)           | `cancelled` | unchanged         |
//! | expired                | `free`                                 | `expired`   | none              |
//! | payment failed         | no change                              |             |                   |
//!
//! A capture is a renewal when the provider is Paystack and the subject holds
//! a Paystack subscription code, or when the metadata declares a member plan.
//!
//! Output is always a full tuple. Reapplying the same event at the same `now`
//! yields the same tuple.

use crate::config::ReconcilerConfig;
use crate::events::{EventKind, PaymentEvent};
use crate::state::{Entitlement, EntitlementStatus, PaymentProvider, PlanType, ProviderRefs, Tier};
use chrono::{DateTime, Utc};

/// Result of reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Persist this tuple, replacing whatever is stored.
    Replace(Entitlement),

    /// Leave the stored entitlement as it is.
    Unchanged {
        /// Short description for logs.
        reason: &'static str,
    },
}

/// Pure reconciler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler with the given durations.
    #[must_use]
    pub const fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Compute the next entitlement.
    ///
    /// `current` is the stored entitlement, `None` when the subject has never
    /// had one.
    #[must_use]
    pub fn reconcile(
        &self,
        event: &PaymentEvent,
        current: Option<&Entitlement>,
        now: DateTime<Utc>,
    ) -> Reconciliation {
        let stored = current.cloned().unwrap_or_default();
        let refs = event.refs.clone().merged_with(&stored.refs);

        let entitlement = match event.kind {
            EventKind::CaptureCompleted => {
                let tier = if Self::is_renewal(event, &refs) {
                    Tier::Member
                } else {
                    Tier::DayPass
                };
                self.active(tier, refs, now)
            }
            EventKind::SubscriptionCreated => self.active(Tier::Member, refs, now),
            EventKind::SubscriptionActivated => {
                let tier = if stored.tier == Tier::Member {
                    Tier::Member
                } else {
                    Tier::DayPass
                };
                self.active(tier, refs, now)
            }
            EventKind::SubscriptionCancelled | EventKind::SubscriptionSuspended => {
                let tier = if stored.tier == Tier::Free {
                    Tier::Member
                } else {
                    stored.tier
                };
                Entitlement {
                    tier,
                    status: EntitlementStatus::Cancelled,
                    expires_at: stored.expires_at,
                    refs,
                }
            }
            EventKind::SubscriptionExpired => Entitlement {
                tier: Tier::Free,
                status: EntitlementStatus::Expired,
                expires_at: None,
                refs,
            },
            EventKind::PaymentFailed => {
                return Reconciliation::Unchanged {
                    reason: "payment failures are not acted on",
                };
            }
        };

        Reconciliation::Replace(entitlement)
    }

    /// Expiry for a newly activated tier.
    #[must_use]
    pub fn expiry_for(&self, tier: Tier, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match tier {
            Tier::Free => None,
            Tier::DayPass => Some(now + self.config.day_pass_duration),
            Tier::Member => Some(now + self.config.member_duration),
        }
    }

    fn active(&self, tier: Tier, refs: ProviderRefs, now: DateTime<Utc>) -> Entitlement {
        Entitlement {
            tier,
            status: EntitlementStatus::Active,
            expires_at: self.expiry_for(tier, now),
            refs,
        }
    }

    // Decided on the merged refs so a redelivered renewal stays a renewal.
    fn is_renewal(event: &PaymentEvent, refs: &ProviderRefs) -> bool {
        event.plan == Some(PlanType::Member)
            || (event.provider() == PaymentProvider::Paystack
                && refs.paystack_subscription_code().is_some())
    }
}
