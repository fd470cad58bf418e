//! Day pass store trait.

use crate::error::Result;
use crate::state::{AnonymousSessionId, DayPass, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Anonymous day pass store, keyed by session id.
pub trait DayPassStore: Send + Sync {
    /// Get the pass for a session, merged or not.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn get(
        &self,
        session_id: AnonymousSessionId,
    ) -> impl Future<Output = Result<Option<DayPass>>> + Send;

    /// Insert the pass, or overwrite the existing unmerged row for the same
    /// session.
    ///
    /// An overwrite keeps the original `created_at`. A row that was already
    /// merged into an account is left untouched.
    ///
    /// # Returns
    ///
    /// `false` if the session's pass was already merged and nothing was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn upsert(&self, pass: &DayPass) -> impl Future<Output = Result<bool>> + Send;

    /// Mark an unmerged pass as transferred to `user_id`.
    ///
    /// # Returns
    ///
    /// `false` if there was no unmerged pass for the session.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn mark_merged(
        &self,
        session_id: AnonymousSessionId,
        user_id: UserId,
        merged_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;
}
