//! PayPal API client.
//!
//! Webhook authenticity is checked by asking PayPal, using an access token
//! obtained with the client-credentials grant.

use crate::error::{BillingError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// PayPal transmission headers of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookTransmission {
    /// `paypal-transmission-id`
    pub transmission_id: String,
    /// `paypal-transmission-time`
    pub transmission_time: String,
    /// `paypal-transmission-sig`
    pub transmission_sig: String,
    /// `paypal-cert-url`
    pub cert_url: String,
    /// `paypal-auth-algo`
    pub auth_algo: String,
}

/// PayPal REST API.
pub trait PayPalApi: Send + Sync {
    /// Ask PayPal whether a webhook delivery is authentic.
    ///
    /// # Returns
    ///
    /// `true` when PayPal answers `SUCCESS`.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON, the client is not configured,
    /// or a request to PayPal fails.
    fn verify_webhook_signature(
        &self,
        transmission: &WebhookTransmission,
        body: &[u8],
    ) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    #[serde(flatten)]
    transmission: &'a WebhookTransmission,
    webhook_id: &'a str,
    webhook_event: Value,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verification_status: String,
}

/// HTTP client for the PayPal REST API.
#[derive(Clone, Debug)]
pub struct HttpPayPalClient {
    /// API base URL (sandbox or live), without trailing slash.
    base_url: String,

    /// REST app client id.
    client_id: String,

    /// REST app secret (keep confidential).
    client_secret: String,

    /// Id of the webhook registration the deliveries belong to.
    webhook_id: String,

    http_client: Client,
}

impl HttpPayPalClient {
    /// Create a new PayPal client.
    #[must_use]
    pub fn new(base_url: String, client_id: String, client_secret: String, webhook_id: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            webhook_id,
            http_client: Client::new(),
        }
    }

    /// Whether credentials and a webhook id are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.webhook_id.is_empty()
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!("PayPal token request failed: {}", error_body);
            return Err(BillingError::ProviderRequest(
                "PayPal token request failed".to_string(),
            ));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

impl PayPalApi for HttpPayPalClient {
    async fn verify_webhook_signature(
        &self,
        transmission: &WebhookTransmission,
        body: &[u8],
    ) -> Result<bool> {
        if !self.is_configured() {
            return Err(BillingError::VerificationFailed(
                "PayPal credentials are not configured".to_string(),
            ));
        }

        let webhook_event: Value = serde_json::from_slice(body)
            .map_err(|e| BillingError::MalformedPayload(e.to_string()))?;
        let token = self.access_token().await?;

        let request = VerifyRequest {
            transmission,
            webhook_id: &self.webhook_id,
            webhook_event,
        };

        let response = self
            .http_client
            .post(format!(
                "{}/v1/notifications/verify-webhook-signature",
                self.base_url
            ))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!("PayPal signature verification request failed: {}", error_body);
            return Err(BillingError::ProviderRequest(
                "PayPal signature verification request failed".to_string(),
            ));
        }

        let verdict: VerifyResponse = response.json().await?;
        Ok(verdict.verification_status == "SUCCESS")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_shape() {
        let transmission = WebhookTransmission {
            transmission_id: "tid".to_string(),
            transmission_time: "2025-01-01T00:00:00Z".to_string(),
            transmission_sig: "sig".to_string(),
            cert_url: "https://api.paypal.com/cert".to_string(),
            auth_algo: "SHA256withRSA".to_string(),
        };
        let request = VerifyRequest {
            transmission: &transmission,
            webhook_id: "WH-ID",
            webhook_event: serde_json::json!({ "id": "WH-1" }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["transmission_id"], "tid");
        assert_eq!(value["auth_algo"], "SHA256withRSA");
        assert_eq!(value["webhook_id"], "WH-ID");
        assert_eq!(value["webhook_event"]["id"], "WH-1");
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = HttpPayPalClient::new(
            "https://api-m.sandbox.paypal.com".to_string(),
            String::new(),
            String::new(),
            String::new(),
        );
        assert!(!client.is_configured());

        let transmission = WebhookTransmission {
            transmission_id: String::new(),
            transmission_time: String::new(),
            transmission_sig: String::new(),
            cert_url: String::new(),
            auth_algo: String::new(),
        };
        let result = client.verify_webhook_signature(&transmission, b"{}").await;
        assert!(matches!(result, Err(BillingError::VerificationFailed(_))));
    }
}
