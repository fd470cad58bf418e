//! Billing configuration.
//!
//! Values are supplied by the application; the server reads them from the
//! environment.

use crate::constants::{DEFAULT_DAY_PASS_HOURS, DEFAULT_MEMBER_DAYS};
use chrono::Duration;
use std::str::FromStr;

/// Entitlement durations applied by the reconciler.
///
/// Expiry is always computed from these values, never taken from the
/// provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Length of a day pass.
    ///
    /// Default: 3 hours
    pub day_pass_duration: Duration,

    /// Length of one membership period.
    ///
    /// Default: 7 days
    pub member_duration: Duration,
}

impl ReconcilerConfig {
    /// Create configuration with the default durations.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            day_pass_duration: Duration::hours(DEFAULT_DAY_PASS_HOURS),
            member_duration: Duration::days(DEFAULT_MEMBER_DAYS),
        }
    }

    /// Set day pass duration.
    #[must_use]
    pub const fn with_day_pass_duration(mut self, duration: Duration) -> Self {
        self.day_pass_duration = duration;
        self
    }

    /// Set membership period.
    #[must_use]
    pub const fn with_member_duration(mut self, duration: Duration) -> Self {
        self.member_duration = duration;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What to do when a webhook signature fails to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Reject with 401.
    Strict,
    /// Log a warning and keep processing.
    #[default]
    Lenient,
}

impl SignaturePolicy {
    /// Policy for a deployment environment name (`APP_ENV`).
    #[must_use]
    pub fn for_environment(app_env: &str) -> Self {
        if app_env.eq_ignore_ascii_case("production") {
            Self::Strict
        } else {
            Self::Lenient
        }
    }

    /// Whether a failed signature must reject the request.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl FromStr for SignaturePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown signature policy: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.day_pass_duration, Duration::hours(3));
        assert_eq!(config.member_duration, Duration::days(7));
    }

    #[test]
    fn test_builders() {
        let config = ReconcilerConfig::new()
            .with_day_pass_duration(Duration::hours(24))
            .with_member_duration(Duration::days(30));
        assert_eq!(config.day_pass_duration, Duration::hours(24));
        assert_eq!(config.member_duration, Duration::days(30));
    }

    #[test]
    fn test_signature_policy() {
        assert_eq!(SignaturePolicy::for_environment("production"), SignaturePolicy::Strict);
        assert_eq!(SignaturePolicy::for_environment("development"), SignaturePolicy::Lenient);
        assert_eq!("STRICT".parse::<SignaturePolicy>().unwrap(), SignaturePolicy::Strict);
        assert!("sometimes".parse::<SignaturePolicy>().is_err());
    }
}
