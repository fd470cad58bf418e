//! ComicVault billing server.
//!
//! Receives PayPal and Paystack webhooks, reconciles them into user
//! entitlements and anonymous day passes, and serves the small API the
//! frontend needs around checkout and sign-in.
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `POST` | `/api/webhooks/paypal/capture` | PayPal one-time captures |
//! | `POST` | `/api/webhooks/paypal/subscription` | PayPal subscription lifecycle |
//! | `POST` | `/api/webhooks/paystack` | Paystack charges and subscriptions |
//! | `GET` | `/api/payments/paystack/verify` | Post-checkout verify and redirect |
//! | `POST` | `/api/session/anonymous` | Issue the anonymous session cookie |
//! | `GET` | `/api/day-pass/status` | Day pass of the session cookie |
//! | `GET` | `/api/access` | Paid content access check |
//! | `GET` | `/auth/callback` | Sign-in callback, merges the day pass |
//! | `GET` | `/health`, `/ready` | Liveness and readiness |
//!
//! Webhooks answer `200 {"received": true, ...}` for every delivery that
//! parsed, whatever reconciliation made of it.

pub mod api;
pub mod config;
pub mod identity;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use server::{AppSettings, AppState, Backend, PostgresBackend, build_router};
