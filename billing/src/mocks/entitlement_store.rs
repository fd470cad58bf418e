//! Mock entitlement store for testing.

use crate::error::{BillingError, Result};
use crate::providers::EntitlementStore;
use crate::state::{Entitlement, ProviderReference, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock entitlement store.
///
/// Only users added with [`add_user`](Self::add_user) have a profile; writes
/// for anyone else fail with `SubjectNotFound`, like the real table.
#[derive(Debug, Clone, Default)]
pub struct MockEntitlementStore {
    profiles: Arc<Mutex<HashMap<UserId, Entitlement>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockEntitlementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile with a free entitlement.
    pub fn add_user(&self, user_id: UserId) {
        self.set(user_id, Entitlement::default());
    }

    /// Create or overwrite a profile with the given entitlement.
    pub fn set(&self, user_id: UserId, entitlement: Entitlement) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(user_id, entitlement);
        }
    }

    /// Read a profile without going through the async trait.
    #[must_use]
    pub fn snapshot(&self, user_id: UserId) -> Option<Entitlement> {
        self.profiles
            .lock()
            .ok()
            .and_then(|profiles| profiles.get(&user_id).cloned())
    }

    /// Make every subsequent `replace` fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl EntitlementStore for MockEntitlementStore {
    fn get(&self, user_id: UserId) -> impl Future<Output = Result<Option<Entitlement>>> + Send {
        let profiles = Arc::clone(&self.profiles);

        async move {
            Ok(profiles
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                .get(&user_id)
                .cloned())
        }
    }

    fn replace(
        &self,
        user_id: UserId,
        entitlement: &Entitlement,
    ) -> impl Future<Output = Result<()>> + Send {
        let profiles = Arc::clone(&self.profiles);
        let fail = self.fail_writes.load(Ordering::SeqCst);
        let entitlement = entitlement.clone();

        async move {
            if fail {
                return Err(BillingError::Database("connection reset".to_string()));
            }

            let mut profiles = profiles
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?;
            let slot = profiles.get_mut(&user_id).ok_or(BillingError::SubjectNotFound)?;
            *slot = entitlement;
            Ok(())
        }
    }

    fn find_user_by_reference(
        &self,
        reference: &ProviderReference,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send {
        let profiles = Arc::clone(&self.profiles);
        let reference = reference.clone();

        async move {
            Ok(profiles
                .lock()
                .map_err(|_| BillingError::Internal("lock poisoned".to_string()))?
                .iter()
                .find(|(_, entitlement)| entitlement.refs.lookup_keys().contains(&reference))
                .map(|(user_id, _)| *user_id))
        }
    }
}
