//! Entitlement store trait.

use crate::error::Result;
use crate::state::{Entitlement, ProviderReference, UserId};
use std::future::Future;

/// Entitlement store.
///
/// One entitlement per user profile. Writes are full replacements: the store
/// never merges fields, so the tuple written is exactly the tuple read back.
pub trait EntitlementStore: Send + Sync {
    /// Get a user's current entitlement.
    ///
    /// # Returns
    ///
    /// `None` if no profile exists for the user.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn get(&self, user_id: UserId) -> impl Future<Output = Result<Option<Entitlement>>> + Send;

    /// Replace a user's entitlement with the given tuple.
    ///
    /// Refs belonging to the other provider are cleared.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No profile exists → `BillingError::SubjectNotFound`
    /// - Database query fails
    fn replace(
        &self,
        user_id: UserId,
        entitlement: &Entitlement,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Find the user whose stored entitlement carries this correlation id.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn find_user_by_reference(
        &self,
        reference: &ProviderReference,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send;
}
