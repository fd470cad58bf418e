//! Session-to-account merger.
//!
//! Runs when a sign-in completes: a live anonymous day pass held by the
//! browser session is moved onto the user's entitlement.
//!
//! The entitlement write and the pass update are two separate store calls.
//! If the second fails the user keeps the pass and the session keeps it too
//! until it expires.

use crate::environment::BillingEnvironment;
use crate::error::Result;
use crate::providers::{DayPassStore, EntitlementStore};
use crate::state::{AnonymousSessionId, Entitlement, EntitlementStatus, ProviderRefs, Tier, UserId};

/// Session-to-account merger.
#[derive(Clone)]
pub struct SessionMerger<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    env: BillingEnvironment<E, D>,
}

impl<E, D> SessionMerger<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Create a merger.
    #[must_use]
    pub const fn new(env: BillingEnvironment<E, D>) -> Self {
        Self { env }
    }

    /// Move the session's day pass onto `user_id`.
    ///
    /// # Returns
    ///
    /// `false`, with nothing written, if the session has no pass, the pass is
    /// already merged, or it has expired.
    ///
    /// # Errors
    ///
    /// Returns error if a store call fails. Callers in the sign-in flow log it
    /// and carry on.
    pub async fn merge(&self, session_id: AnonymousSessionId, user_id: UserId) -> Result<bool> {
        let now = self.env.now();

        let Some(pass) = self.env.day_passes.get(session_id).await? else {
            tracing::debug!(session_id = %session_id, "No day pass to merge");
            return Ok(false);
        };

        if !pass.is_active_at(now) {
            tracing::debug!(
                session_id = %session_id,
                merged = pass.is_merged(),
                expires_at = %pass.expires_at,
                "Day pass not eligible for merge"
            );
            return Ok(false);
        }

        let entitlement = Entitlement {
            tier: Tier::DayPass,
            status: EntitlementStatus::Active,
            expires_at: Some(pass.expires_at),
            refs: ProviderRefs::from_transaction(pass.payment_provider, pass.transaction_ref.clone()),
        };

        self.env.entitlements.replace(user_id, &entitlement).await?;
        let marked = self
            .env
            .day_passes
            .mark_merged(session_id, user_id, now)
            .await?;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            expires_at = %pass.expires_at,
            marked,
            "Day pass merged onto account"
        );

        Ok(true)
    }
}
