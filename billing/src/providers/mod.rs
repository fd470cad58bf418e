//! Billing providers.
//!
//! Traits for every external dependency of the billing logic: the two stores
//! and the two payment provider APIs. Services depend on these traits; the
//! server wires in the Postgres stores and HTTP clients, tests wire in
//! [`mocks`](crate::mocks).
//!
//! ```text
//! ReconciliationService ─┬─► EntitlementStore ──► profiles
//! DayPassTracker         ├─► DayPassStore     ──► day_passes
//! SessionMerger          │
//! AccessGate            ─┘
//!
//! webhook / verify handlers ─┬─► PaystackApi ──► api.paystack.co
//!                            └─► PayPalApi   ──► api-m.paypal.com
//! ```

pub mod day_pass_store;
pub mod entitlement_store;
pub mod paypal;
pub mod paystack;

pub use day_pass_store::DayPassStore;
pub use entitlement_store::EntitlementStore;
pub use paypal::{HttpPayPalClient, PayPalApi, WebhookTransmission};
pub use paystack::{HttpPaystackClient, PaystackApi};
