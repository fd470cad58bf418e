//! # ComicVault Billing
//!
//! Payment reconciliation and entitlement model for the ComicVault reader.
//!
//! Two payment providers (PayPal and Paystack) and two access modes
//! (subscriptions for signed-in users and day passes for anonymous browser
//! sessions) are unified into a single [`Entitlement`] per subject.
//!
//! ## Architecture
//!
//! ```text
//! raw webhook ──► adapter ──► PaymentEvent ──► ReconciliationService
//!                                                 │  resolve subject
//!                                                 ▼
//!                                            Reconciler (pure)
//!                                                 │  full tuple
//!                                                 ▼
//!                                       EntitlementStore / DayPassStore
//!
//! auth completion ──► SessionMerger ──► EntitlementStore + DayPassStore
//! ```
//!
//! Every collaborator is a trait in [`providers`]; production implementations
//! live in [`stores::postgres`] (feature `postgres`) and the HTTP clients in
//! [`providers::paystack`] and [`providers::paypal`]. In-memory versions live in
//! [`mocks`] (feature `test-utils`).
//!
//! ## Example: anonymous day pass
//!
//! ```rust,ignore
//! use comicvault_billing::*;
//!
//! let outcome = service.apply(adapters::paypal::parse(&body)?.into_payment_event()).await;
//! assert_eq!(outcome, ReconcileOutcome::DayPassGranted { .. });
//! assert!(tracker.is_active(session_id).await?);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod access;
pub mod adapters;
pub mod config;
pub mod constants;
pub mod day_pass;
pub mod environment;
pub mod error;
pub mod events;
pub mod merge;
pub mod providers;
pub mod reconciler;
pub mod reconciliation;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use access::{AccessDecision, AccessGate, AccessSource};
pub use config::{ReconcilerConfig, SignaturePolicy};
pub use day_pass::{DayPassStatus, DayPassTracker};
pub use environment::{BillingEnvironment, Clock, SystemClock};
pub use error::{BillingError, Result};
pub use events::{EventKind, PaymentEvent, SubjectRef};
pub use merge::SessionMerger;
pub use reconciler::{Reconciler, Reconciliation};
pub use reconciliation::{ReconcileOutcome, ReconciliationService};
pub use state::{
    AnonymousSessionId, DayPass, Entitlement, EntitlementStatus, PaymentProvider, PlanType,
    ProviderReference, ProviderRefs, Tier, UserId,
};
