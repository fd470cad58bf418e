//! Managed auth platform.
//!
//! User accounts live on an external auth platform. The server only needs two
//! things from it: exchanging the sign-in redirect's authorization code for the
//! signed-in user, and resolving a bearer access token to a user.

use comicvault_billing::{BillingError, Result, UserId};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;

/// External identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Exchange a sign-in authorization code for the user it belongs to.
    ///
    /// # Errors
    ///
    /// - The platform refuses the code → `BillingError::VerificationFailed`
    /// - Transport failure → `BillingError::ProviderRequest`
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<UserId>> + Send;

    /// Resolve an access token to its user.
    ///
    /// Returns `None` when the token is expired or unknown.
    ///
    /// # Errors
    ///
    /// Returns error if the platform cannot be reached.
    fn authenticate(&self, access_token: &str)
    -> impl Future<Output = Result<Option<UserId>>> + Send;
}

#[derive(Debug, Deserialize)]
struct PlatformUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: PlatformUser,
}

/// HTTP client for the auth platform.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    token_url: String,
    user_url: String,
    api_key: String,
    http_client: Client,
}

impl HttpIdentityProvider {
    /// Create a new client.
    #[must_use]
    pub fn new(token_url: String, user_url: String, api_key: String) -> Self {
        Self {
            token_url,
            user_url,
            api_key,
            http_client: Client::new(),
        }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<UserId> {
        if self.token_url.is_empty() {
            return Err(BillingError::VerificationFailed(
                "identity provider is not configured".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, "Authorization code exchange refused");
            return Err(BillingError::VerificationFailed(format!(
                "code exchange refused with status {status}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        UserId::parse(&token.user.id)
    }

    async fn authenticate(&self, access_token: &str) -> Result<Option<UserId>> {
        if self.user_url.is_empty() {
            return Ok(None);
        }

        let response = self
            .http_client
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user: PlatformUser = response.json().await?;
                Ok(UserId::parse(&user.id).ok())
            }
            status => Err(BillingError::ProviderRequest(format!(
                "user lookup failed with status {status}"
            ))),
        }
    }
}

/// In-memory identity provider for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::IdentityProvider;
    use comicvault_billing::{BillingError, Result, UserId};
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    /// Knows a fixed set of authorization codes and access tokens.
    #[derive(Debug, Clone, Default)]
    pub struct MockIdentityProvider {
        codes: Arc<Mutex<HashMap<String, UserId>>>,
        tokens: Arc<Mutex<HashMap<String, UserId>>>,
    }

    impl MockIdentityProvider {
        /// Create a provider that knows nobody.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Accept `code` as a sign-in for `user_id`.
        #[must_use]
        pub fn with_code(self, code: &str, user_id: UserId) -> Self {
            if let Ok(mut codes) = self.codes.lock() {
                codes.insert(code.to_string(), user_id);
            }
            self
        }

        /// Accept `token` as an access token for `user_id`.
        #[must_use]
        pub fn with_token(self, token: &str, user_id: UserId) -> Self {
            if let Ok(mut tokens) = self.tokens.lock() {
                tokens.insert(token.to_string(), user_id);
            }
            self
        }
    }

    impl IdentityProvider for MockIdentityProvider {
        fn exchange_code(&self, code: &str) -> impl Future<Output = Result<UserId>> + Send {
            let codes = Arc::clone(&self.codes);
            let code = code.to_string();

            async move {
                codes
                    .lock()
                    .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                    .get(&code)
                    .copied()
                    .ok_or_else(|| BillingError::VerificationFailed("unknown code".to_string()))
            }
        }

        fn authenticate(
            &self,
            access_token: &str,
        ) -> impl Future<Output = Result<Option<UserId>>> + Send {
            let tokens = Arc::clone(&self.tokens);
            let access_token = access_token.to_string();

            async move {
                Ok(tokens
                    .lock()
                    .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                    .get(&access_token)
                    .copied())
            }
        }
    }
}
