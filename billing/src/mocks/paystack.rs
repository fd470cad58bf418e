//! Mock Paystack API for testing.

use crate::adapters::paystack::ChargeData;
use crate::error::{BillingError, Result};
use crate::providers::PaystackApi;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock Paystack API.
///
/// Knows only the transactions it was given.
#[derive(Debug, Clone, Default)]
pub struct MockPaystackApi {
    transactions: Arc<Mutex<HashMap<String, ChargeData>>>,
}

impl MockPaystackApi {
    /// Create an API that knows no transactions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transaction for `verify_transaction`.
    #[must_use]
    pub fn with_transaction(self, transaction: ChargeData) -> Self {
        if let Ok(mut transactions) = self.transactions.lock() {
            transactions.insert(transaction.reference.clone(), transaction);
        }
        self
    }
}

impl PaystackApi for MockPaystackApi {
    fn verify_transaction(&self, reference: &str) -> impl Future<Output = Result<ChargeData>> + Send {
        let transactions = Arc::clone(&self.transactions);
        let reference = reference.to_string();

        async move {
            transactions
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                .get(&reference)
                .cloned()
                .ok_or_else(|| {
                    BillingError::VerificationFailed("Transaction reference not found".to_string())
                })
        }
    }
}
