//! Billing environment.
//!
//! Store handles and the clock are passed explicitly to every service. There is
//! no process-wide state.

use crate::config::ReconcilerConfig;
use crate::providers::{DayPassStore, EntitlementStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock abstraction so expiry arithmetic is deterministic under test.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Dependencies shared by the reconciliation service, tracker, merger and
/// access gate.
///
/// # Type Parameters
///
/// - `E`: Entitlement store
/// - `D`: Day pass store
#[derive(Clone)]
pub struct BillingEnvironment<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Entitlement store (`profiles` table).
    pub entitlements: E,

    /// Day pass store (`day_passes` table).
    pub day_passes: D,

    /// Time source.
    pub clock: Arc<dyn Clock>,

    /// Entitlement durations.
    pub config: ReconcilerConfig,
}

impl<E, D> BillingEnvironment<E, D>
where
    E: EntitlementStore + Clone,
    D: DayPassStore + Clone,
{
    /// Create an environment using the system clock and default durations.
    #[must_use]
    pub fn new(entitlements: E, day_passes: D) -> Self {
        Self {
            entitlements,
            day_passes,
            clock: Arc::new(SystemClock),
            config: ReconcilerConfig::default(),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the entitlement durations.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current time from the configured clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
