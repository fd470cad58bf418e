//! Anonymous day pass tracker.
//!
//! Maps an anonymous session id to a short-lived pass until the visitor signs
//! in and the pass is merged onto their account.

use crate::environment::BillingEnvironment;
use crate::error::Result;
use crate::providers::{DayPassStore, EntitlementStore};
use crate::state::{AnonymousSessionId, DayPass, PaymentProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Day pass status as seen by the session holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPassStatus {
    /// Whether the pass currently grants access.
    pub active: bool,
    /// End of access, when a live pass exists.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Day pass tracker.
#[derive(Clone)]
pub struct DayPassTracker<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    env: BillingEnvironment<E, D>,
}

impl<E, D> DayPassTracker<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Create a tracker over the environment's day pass store.
    #[must_use]
    pub const fn new(env: BillingEnvironment<E, D>) -> Self {
        Self { env }
    }

    /// Whether the session holds an unmerged, unexpired pass.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn is_active(&self, session_id: AnonymousSessionId) -> Result<bool> {
        let now = self.env.now();
        Ok(self
            .env
            .day_passes
            .get(session_id)
            .await?
            .is_some_and(|pass| pass.is_active_at(now)))
    }

    /// Grant a pass to the session.
    ///
    /// Buying again under the same session overwrites the expiry rather than
    /// failing. Once the session's pass has been merged into an account the
    /// session stays inert: nothing is written and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn create(
        &self,
        session_id: AnonymousSessionId,
        provider: PaymentProvider,
        transaction_ref: Option<String>,
    ) -> Result<Option<DayPass>> {
        let now = self.env.now();
        let pass = DayPass {
            session_id,
            expires_at: now + self.env.config.day_pass_duration,
            payment_provider: provider,
            transaction_ref,
            user_id: None,
            created_at: now,
        };

        if !self.env.day_passes.upsert(&pass).await? {
            tracing::warn!(
                session_id = %session_id,
                provider = provider.as_str(),
                "Day pass already merged into an account; capture not re-applied"
            );
            return Ok(None);
        }

        tracing::info!(
            session_id = %session_id,
            provider = provider.as_str(),
            expires_at = %pass.expires_at,
            "Day pass granted"
        );

        Ok(Some(pass))
    }

    /// Status for display to the session holder.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn status(&self, session_id: AnonymousSessionId) -> Result<DayPassStatus> {
        let now = self.env.now();
        let status = match self.env.day_passes.get(session_id).await? {
            Some(pass) if pass.is_active_at(now) => DayPassStatus {
                active: true,
                expires_at: Some(pass.expires_at),
            },
            _ => DayPassStatus {
                active: false,
                expires_at: None,
            },
        };
        Ok(status)
    }
}
