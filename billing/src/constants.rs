//! Billing constants.

/// Name of the cookie carrying the anonymous session id.
pub const ANON_SESSION_COOKIE: &str = "comic_anon_session";

/// Lifetime of the anonymous session cookie in seconds (3 hours).
pub const ANON_SESSION_MAX_AGE_SECS: i64 = 3 * 60 * 60;

/// Default day pass duration in hours.
pub const DEFAULT_DAY_PASS_HOURS: i64 = 3;

/// Default membership period in days.
pub const DEFAULT_MEMBER_DAYS: i64 = 7;

/// Paystack webhook signature header.
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// PayPal transmission headers required to verify a webhook.
pub mod paypal_headers {
    /// Unique transmission id.
    pub const TRANSMISSION_ID: &str = "paypal-transmission-id";
    /// Transmission timestamp.
    pub const TRANSMISSION_TIME: &str = "paypal-transmission-time";
    /// Base64 transmission signature.
    pub const TRANSMISSION_SIG: &str = "paypal-transmission-sig";
    /// URL of the signing certificate.
    pub const CERT_URL: &str = "paypal-cert-url";
    /// Signing algorithm.
    pub const AUTH_ALGO: &str = "paypal-auth-algo";
}
