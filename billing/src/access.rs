//! Access gate.
//!
//! Decides whether a request may read paid content, from the signed-in user's
//! entitlement and the anonymous session's day pass.

use crate::environment::BillingEnvironment;
use crate::error::Result;
use crate::providers::{DayPassStore, EntitlementStore};
use crate::state::{AnonymousSessionId, Tier, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where access comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    /// Active membership on the account.
    Member,
    /// Day pass on the account (bought signed in, or merged).
    DayPass,
    /// Day pass held by the anonymous session.
    AnonymousDayPass,
    /// No paid access.
    None,
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether paid content may be served.
    pub granted: bool,
    /// Source of the grant.
    pub source: AccessSource,
    /// When the grant ends.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessDecision {
    const DENIED: Self = Self {
        granted: false,
        source: AccessSource::None,
        expires_at: None,
    };
}

/// Access gate.
#[derive(Clone)]
pub struct AccessGate<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    env: BillingEnvironment<E, D>,
}

impl<E, D> AccessGate<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Create an access gate.
    #[must_use]
    pub const fn new(env: BillingEnvironment<E, D>) -> Self {
        Self { env }
    }

    /// Check access for a request.
    ///
    /// The account's entitlement is consulted first, then the session's day
    /// pass. An `active` entitlement past its expiry does not grant access.
    ///
    /// # Errors
    ///
    /// Returns error if a store query fails.
    pub async fn check(
        &self,
        user_id: Option<UserId>,
        session_id: Option<AnonymousSessionId>,
    ) -> Result<AccessDecision> {
        let now = self.env.now();

        if let Some(user_id) = user_id {
            if let Some(entitlement) = self.env.entitlements.get(user_id).await? {
                if entitlement.grants_access_at(now) {
                    let source = match entitlement.tier {
                        Tier::Member => AccessSource::Member,
                        Tier::DayPass | Tier::Free => AccessSource::DayPass,
                    };
                    return Ok(AccessDecision {
                        granted: true,
                        source,
                        expires_at: entitlement.expires_at,
                    });
                }
            }
        }

        if let Some(session_id) = session_id {
            if let Some(pass) = self.env.day_passes.get(session_id).await? {
                if pass.is_active_at(now) {
                    return Ok(AccessDecision {
                        granted: true,
                        source: AccessSource::AnonymousDayPass,
                        expires_at: Some(pass.expires_at),
                    });
                }
            }
        }

        Ok(AccessDecision::DENIED)
    }
}
