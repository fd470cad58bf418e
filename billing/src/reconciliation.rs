//! Reconciliation service.
//!
//! The I/O shell around the pure [`Reconciler`]: resolves the subject of a
//! canonical event, loads the stored entitlement, reconciles and persists.
//!
//! Nothing here returns an error to the webhook handler. Resolution failures
//! and store failures are logged and reported as an outcome so the handler can
//! still acknowledge the delivery.

use crate::day_pass::DayPassTracker;
use crate::environment::BillingEnvironment;
use crate::error::{BillingError, Result};
use crate::events::{EventKind, PaymentEvent, SubjectRef};
use crate::providers::{DayPassStore, EntitlementStore};
use crate::reconciler::{Reconciler, Reconciliation};
use crate::state::{AnonymousSessionId, Entitlement, UserId};
use chrono::{DateTime, Utc};

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A user's entitlement was replaced.
    Applied {
        /// Subject.
        user_id: UserId,
        /// Tuple written.
        entitlement: Entitlement,
    },

    /// An anonymous session was granted a day pass.
    DayPassGranted {
        /// Subject.
        session_id: AnonymousSessionId,
        /// End of the pass.
        expires_at: DateTime<Utc>,
    },

    /// The event does not change anything.
    Unchanged {
        /// Short description.
        reason: &'static str,
    },

    /// No subject could be resolved, or the subject cannot receive this event.
    Dropped {
        /// Short description.
        reason: &'static str,
    },

    /// A store call failed; the write was not retried.
    Failed(BillingError),
}

impl ReconcileOutcome {
    /// Label used in metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::DayPassGranted { .. } => "day_pass_granted",
            Self::Unchanged { .. } => "unchanged",
            Self::Dropped { .. } => "dropped",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the subject now holds the state the event called for.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Applied { .. } | Self::DayPassGranted { .. } | Self::Unchanged { .. }
        )
    }
}

/// Reconciliation service.
#[derive(Clone)]
pub struct ReconciliationService<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    env: BillingEnvironment<E, D>,
    reconciler: Reconciler,
    tracker: DayPassTracker<E, D>,
}

impl<E, D> ReconciliationService<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Create a service.
    #[must_use]
    pub fn new(env: BillingEnvironment<E, D>) -> Self {
        Self {
            reconciler: Reconciler::new(env.config),
            tracker: DayPassTracker::new(env.clone()),
            env,
        }
    }

    /// Apply one canonical event.
    pub async fn apply(&self, event: PaymentEvent) -> ReconcileOutcome {
        let provider = event.provider().as_str();
        let kind = event.kind.as_str();

        let outcome = match self.resolve(&event).await {
            Ok(Some(SubjectRef::User(user_id))) => self.apply_to_user(user_id, &event).await,
            Ok(Some(SubjectRef::Session(session_id))) => {
                self.apply_to_session(session_id, &event).await
            }
            Ok(None) => {
                tracing::error!(
                    provider,
                    event_kind = kind,
                    refs = ?event.refs,
                    "Could not resolve payment subject; event dropped"
                );
                ReconcileOutcome::Dropped {
                    reason: "subject not resolved",
                }
            }
            Err(error) => {
                tracing::error!(provider, event_kind = kind, %error, "Subject lookup failed");
                ReconcileOutcome::Failed(error)
            }
        };

        tracing::debug!(provider, event_kind = kind, outcome = outcome.label(), "Event reconciled");
        outcome
    }

    /// Explicit subject first, then stored correlation ids in resolution order.
    async fn resolve(&self, event: &PaymentEvent) -> Result<Option<SubjectRef>> {
        if let Some(subject) = event.subject {
            return Ok(Some(subject));
        }

        for reference in event.refs.lookup_keys() {
            if let Some(user_id) = self.env.entitlements.find_user_by_reference(&reference).await? {
                tracing::debug!(
                    user_id = %user_id,
                    column = reference.column(),
                    "Resolved subject by stored reference"
                );
                return Ok(Some(SubjectRef::User(user_id)));
            }
        }

        Ok(None)
    }

    async fn apply_to_user(&self, user_id: UserId, event: &PaymentEvent) -> ReconcileOutcome {
        let current = match self.env.entitlements.get(user_id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                tracing::error!(user_id = %user_id, "No profile for payment subject; event dropped");
                return ReconcileOutcome::Dropped {
                    reason: "no profile for user",
                };
            }
            Err(error) => {
                tracing::error!(user_id = %user_id, %error, "Failed to load entitlement");
                return ReconcileOutcome::Failed(error);
            }
        };

        match self.reconciler.reconcile(event, Some(&current), self.env.now()) {
            Reconciliation::Replace(entitlement) => {
                if let Err(error) = self.env.entitlements.replace(user_id, &entitlement).await {
                    tracing::error!(user_id = %user_id, %error, "Failed to write entitlement");
                    return ReconcileOutcome::Failed(error);
                }

                tracing::info!(
                    user_id = %user_id,
                    provider = entitlement.payment_provider().as_str(),
                    event_kind = event.kind.as_str(),
                    tier = entitlement.tier.as_str(),
                    status = entitlement.status.as_str(),
                    expires_at = ?entitlement.expires_at,
                    "Entitlement updated"
                );
                ReconcileOutcome::Applied {
                    user_id,
                    entitlement,
                }
            }
            Reconciliation::Unchanged { reason } => {
                tracing::warn!(
                    user_id = %user_id,
                    provider = event.provider().as_str(),
                    event_kind = event.kind.as_str(),
                    reason,
                    "Payment event left entitlement unchanged"
                );
                ReconcileOutcome::Unchanged { reason }
            }
        }
    }

    async fn apply_to_session(
        &self,
        session_id: AnonymousSessionId,
        event: &PaymentEvent,
    ) -> ReconcileOutcome {
        if event.kind != EventKind::CaptureCompleted {
            tracing::error!(
                session_id = %session_id,
                event_kind = event.kind.as_str(),
                "Anonymous sessions only take one-time captures; event dropped"
            );
            return ReconcileOutcome::Dropped {
                reason: "anonymous subject for subscription event",
            };
        }

        let transaction_ref = event.refs.transaction_ref().map(str::to_string);
        match self
            .tracker
            .create(session_id, event.provider(), transaction_ref)
            .await
        {
            Ok(Some(pass)) => ReconcileOutcome::DayPassGranted {
                session_id,
                expires_at: pass.expires_at,
            },
            Ok(None) => ReconcileOutcome::Unchanged {
                reason: "day pass already merged into an account",
            },
            Err(error) => {
                tracing::error!(session_id = %session_id, %error, "Failed to write day pass");
                ReconcileOutcome::Failed(error)
            }
        }
    }
}
