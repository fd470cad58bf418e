//! Application state for the billing HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Billing services (reconciliation, day pass tracker, merger, access gate)
//! - Payment provider clients (PayPal, Paystack)
//! - Identity provider (sign-in code exchange, bearer tokens)

use crate::identity::{HttpIdentityProvider, IdentityProvider};
use comicvault_billing::providers::{
    DayPassStore, EntitlementStore, HttpPayPalClient, HttpPaystackClient, PayPalApi, PaystackApi,
};
use comicvault_billing::stores::{PostgresDayPassStore, PostgresEntitlementStore};
use comicvault_billing::{
    AccessGate, BillingEnvironment, DayPassTracker, ReconciliationService, SessionMerger,
    SignaturePolicy,
};
use sqlx::PgPool;
use std::sync::Arc;

/// The concrete stores and clients a server runs with.
///
/// Production uses [`PostgresBackend`]; tests plug in the in-memory mocks.
pub trait Backend: Send + Sync + 'static {
    /// Entitlement store.
    type Entitlements: EntitlementStore + Clone + 'static;
    /// Day pass store.
    type DayPasses: DayPassStore + Clone + 'static;
    /// Paystack API client.
    type Paystack: PaystackApi + 'static;
    /// PayPal API client.
    type PayPal: PayPalApi + 'static;
    /// Identity provider.
    type Identity: IdentityProvider + 'static;
}

/// Postgres stores with the HTTP provider clients.
#[derive(Debug, Clone, Copy)]
pub struct PostgresBackend;

impl Backend for PostgresBackend {
    type Entitlements = PostgresEntitlementStore;
    type DayPasses = PostgresDayPassStore;
    type Paystack = HttpPaystackClient;
    type PayPal = HttpPayPalClient;
    type Identity = HttpIdentityProvider;
}

/// Request handling settings.
#[derive(Clone)]
pub struct AppSettings {
    /// Paystack secret key for webhook HMAC. Empty when unconfigured.
    pub paystack_secret: String,
    /// What to do when a webhook signature does not verify.
    pub signature_policy: SignaturePolicy,
    /// Frontend URL used for redirects, without trailing slash.
    pub app_url: String,
    /// Add `Secure` to the anonymous session cookie.
    pub secure_cookies: bool,
}

/// Application state shared across all HTTP handlers.
///
/// It's cloned (cheaply via Arc) for each request.
pub struct AppState<B: Backend> {
    /// Webhook and verify-redirect reconciliation
    pub reconciliation: ReconciliationService<B::Entitlements, B::DayPasses>,

    /// Anonymous day passes
    pub tracker: DayPassTracker<B::Entitlements, B::DayPasses>,

    /// Day pass to account merge at sign-in
    pub merger: SessionMerger<B::Entitlements, B::DayPasses>,

    /// Paid content access checks
    pub access: AccessGate<B::Entitlements, B::DayPasses>,

    /// Paystack transaction verification
    pub paystack: Arc<B::Paystack>,

    /// PayPal webhook signature verification
    pub paypal: Arc<B::PayPal>,

    /// Sign-in code exchange and bearer token lookup
    pub identity: Arc<B::Identity>,

    /// Request handling settings
    pub settings: Arc<AppSettings>,

    /// Database pool for readiness checks (absent in tests)
    pub pool: Option<PgPool>,
}

impl<B: Backend> AppState<B> {
    /// Create a new application state.
    ///
    /// All billing services share `env`.
    #[must_use]
    pub fn new(
        env: BillingEnvironment<B::Entitlements, B::DayPasses>,
        paystack: B::Paystack,
        paypal: B::PayPal,
        identity: B::Identity,
        settings: AppSettings,
    ) -> Self {
        Self {
            reconciliation: ReconciliationService::new(env.clone()),
            tracker: DayPassTracker::new(env.clone()),
            merger: SessionMerger::new(env.clone()),
            access: AccessGate::new(env),
            paystack: Arc::new(paystack),
            paypal: Arc::new(paypal),
            identity: Arc::new(identity),
            settings: Arc::new(settings),
            pool: None,
        }
    }

    /// Attach the database pool checked by `/ready`.
    #[must_use]
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            reconciliation: self.reconciliation.clone(),
            tracker: self.tracker.clone(),
            merger: self.merger.clone(),
            access: self.access.clone(),
            paystack: Arc::clone(&self.paystack),
            paypal: Arc::clone(&self.paypal),
            identity: Arc::clone(&self.identity),
            settings: Arc::clone(&self.settings),
            pool: self.pool.clone(),
        }
    }
}
