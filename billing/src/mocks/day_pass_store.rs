//! Mock day pass store for testing.

use crate::error::{BillingError, Result};
use crate::providers::DayPassStore;
use crate::state::{AnonymousSessionId, DayPass, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock day pass store.
///
/// Uses in-memory storage for testing.
#[derive(Debug, Clone, Default)]
pub struct MockDayPassStore {
    passes: Arc<Mutex<HashMap<AnonymousSessionId, DayPass>>>,
}

impl MockDayPassStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pass directly.
    pub fn insert(&self, pass: DayPass) {
        if let Ok(mut passes) = self.passes.lock() {
            passes.insert(pass.session_id, pass);
        }
    }

    /// Read a pass without going through the async trait.
    #[must_use]
    pub fn snapshot(&self, session_id: AnonymousSessionId) -> Option<DayPass> {
        self.passes
            .lock()
            .ok()
            .and_then(|passes| passes.get(&session_id).cloned())
    }
}

impl DayPassStore for MockDayPassStore {
    fn get(
        &self,
        session_id: AnonymousSessionId,
    ) -> impl Future<Output = Result<Option<DayPass>>> + Send {
        let passes = Arc::clone(&self.passes);

        async move {
            Ok(passes
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                .get(&session_id)
                .cloned())
        }
    }

    fn upsert(&self, pass: &DayPass) -> impl Future<Output = Result<bool>> + Send {
        let passes = Arc::clone(&self.passes);
        let mut pass = pass.clone();

        async move {
            let mut passes = passes
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?;
            if let Some(existing) = passes.get(&pass.session_id) {
                if existing.is_merged() {
                    return Ok(false);
                }
                pass.created_at = existing.created_at;
            }
            passes.insert(pass.session_id, pass);
            Ok(true)
        }
    }

    fn mark_merged(
        &self,
        session_id: AnonymousSessionId,
        user_id: UserId,
        _merged_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send {
        let passes = Arc::clone(&self.passes);

        async move {
            let mut passes = passes
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?;
            match passes.get_mut(&session_id) {
                Some(pass) if pass.user_id.is_none() => {
                    pass.user_id = Some(user_id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }
}
