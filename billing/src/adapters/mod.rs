//! Provider event adapters.
//!
//! Each adapter turns a raw webhook body into a typed, provider-specific event
//! enum (one variant per event kind the provider sends that we model, plus
//! `Unrecognized`) and then into a canonical [`PaymentEvent`].
//!
//! Parsing failures are [`BillingError::MalformedPayload`]; everything after a
//! successful parse is acknowledged to the provider.
//!
//! [`PaymentEvent`]: crate::events::PaymentEvent
//! [`BillingError::MalformedPayload`]: crate::error::BillingError::MalformedPayload

pub mod paypal;
pub mod paystack;

pub use paypal::{PayPalEvent, PayPalWebhook};
pub use paystack::PaystackEvent;
