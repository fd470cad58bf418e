//! Paystack API client.

use crate::adapters::paystack::ChargeData;
use crate::error::{BillingError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;

/// Paystack REST API.
pub trait PaystackApi: Send + Sync {
    /// Look up a transaction by reference.
    ///
    /// The transaction is returned whatever its status; callers check
    /// [`ChargeData::is_successful`].
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The HTTP request fails → `BillingError::ProviderRequest`
    /// - Paystack does not know the reference → `BillingError::VerificationFailed`
    fn verify_transaction(&self, reference: &str) -> impl Future<Output = Result<ChargeData>> + Send;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<ChargeData>,
}

/// HTTP client for `api.paystack.co`.
///
/// # Example
///
/// ```no_run
/// use comicvault_billing::providers::HttpPaystackClient;
///
/// let paystack = HttpPaystackClient::new(
///     "https://api.paystack.co".to_string(),
///     "sk_test_xxx".to_string(),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct HttpPaystackClient {
    /// API base URL, without trailing slash.
    base_url: String,

    /// Secret key (keep confidential).
    secret_key: String,

    http_client: Client,
}

impl HttpPaystackClient {
    /// Create a new Paystack client.
    #[must_use]
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
            http_client: Client::new(),
        }
    }
}

impl PaystackApi for HttpPaystackClient {
    async fn verify_transaction(&self, reference: &str) -> Result<ChargeData> {
        let url = format!("{}/transaction/verify/{reference}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let http_status = response.status();
        let body: VerifyResponse = response.json().await?;

        if !http_status.is_success() || !body.status {
            tracing::warn!(
                reference,
                status = %http_status,
                message = %body.message,
                "Paystack transaction verification refused"
            );
            return Err(BillingError::VerificationFailed(body.message));
        }

        body.data.ok_or_else(|| {
            BillingError::VerificationFailed("verification response carried no data".to_string())
        })
    }
}
