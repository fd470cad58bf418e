//! Mock PayPal API for testing.

use crate::error::Result;
use crate::providers::{PayPalApi, WebhookTransmission};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock PayPal API with a fixed verdict.
#[derive(Debug, Clone)]
pub struct MockPayPalApi {
    verdict: bool,
    calls: Arc<AtomicUsize>,
}

impl MockPayPalApi {
    /// API that accepts every signature.
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            verdict: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// API that rejects every signature.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            verdict: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of verification calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PayPalApi for MockPayPalApi {
    fn verify_webhook_signature(
        &self,
        _transmission: &WebhookTransmission,
        _body: &[u8],
    ) -> impl Future<Output = Result<bool>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let verdict = self.verdict;
        async move { Ok(verdict) }
    }
}
