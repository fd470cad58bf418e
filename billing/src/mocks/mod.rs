//! Mock provider implementations for testing.
//!
//! Simple, in-memory implementations of all provider traits plus a settable
//! clock, for use in unit and integration tests.

pub mod clock;
pub mod day_pass_store;
pub mod entitlement_store;
pub mod paypal;
pub mod paystack;

pub use clock::FixedClock;
pub use day_pass_store::MockDayPassStore;
pub use entitlement_store::MockEntitlementStore;
pub use paypal::MockPayPalApi;
pub use paystack::MockPaystackApi;
