//! Error types for billing and entitlement operations.

use thiserror::Error;

/// Result type alias for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Error taxonomy for webhook intake, reconciliation and storage.
///
/// Transport errors are surfaced to the caller at the HTTP boundary. Everything
/// else that happens after a payload parsed is logged by the webhook handlers
/// and never reaches the payment provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    // ═══════════════════════════════════════════════════════════
    // Payload Errors
    // ═══════════════════════════════════════════════════════════

    /// Webhook body did not match the provider's envelope.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// Required signature header was absent.
    #[error("Missing signature header: {header}")]
    MissingSignature {
        /// Header that was expected
        header: &'static str,
    },

    /// Signature did not validate against the provider secret.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    // ═══════════════════════════════════════════════════════════
    // Resolution Errors
    // ═══════════════════════════════════════════════════════════

    /// No user profile exists for the subject.
    #[error("Subject not found")]
    SubjectNotFound,

    /// An identifier could not be parsed.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // ═══════════════════════════════════════════════════════════
    // Provider Errors
    // ═══════════════════════════════════════════════════════════

    /// HTTP call to a payment or identity provider failed.
    #[error("Provider request failed: {0}")]
    ProviderRequest(String),

    /// Provider answered but refused the verification.
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Returns `true` if this error indicates a security issue.
    ///
    /// # Examples
    ///
    /// ```
    /// # use comicvault_billing::BillingError;
    /// assert!(BillingError::InvalidSignature.is_security_issue());
    /// assert!(!BillingError::Database("timeout".into()).is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::InvalidSignature | Self::MissingSignature { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        Self::ProviderRequest(err.to_string())
    }
}
