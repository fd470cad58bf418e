//! PostgreSQL day pass store.

use crate::error::{BillingError, Result};
use crate::providers::DayPassStore;
use crate::state::{AnonymousSessionId, DayPass, PaymentProvider, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL day pass store.
///
/// Rows are never deleted; merging sets `user_id` and `merged_at`.
#[derive(Clone)]
pub struct PostgresDayPassStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresDayPassStore {
    /// Create a new store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DayPassRow {
    session_id: uuid::Uuid,
    expires_at: DateTime<Utc>,
    payment_provider: String,
    transaction_ref: Option<String>,
    user_id: Option<uuid::Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DayPassRow> for DayPass {
    type Error = BillingError;

    fn try_from(row: DayPassRow) -> Result<Self> {
        Ok(Self {
            session_id: AnonymousSessionId(row.session_id),
            expires_at: row.expires_at,
            payment_provider: row.payment_provider.parse::<PaymentProvider>()?,
            transaction_ref: row.transaction_ref,
            user_id: row.user_id.map(UserId),
            created_at: row.created_at,
        })
    }
}

impl DayPassStore for PostgresDayPassStore {
    async fn get(&self, session_id: AnonymousSessionId) -> Result<Option<DayPass>> {
        let row: Option<DayPassRow> = sqlx::query_as(
            r"
            SELECT session_id, expires_at, payment_provider, transaction_ref, user_id, created_at
            FROM day_passes
            WHERE session_id = $1
            ",
        )
        .bind(session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::Database(format!("Failed to get day pass: {e}")))?;

        row.map(DayPass::try_from).transpose()
    }

    async fn upsert(&self, pass: &DayPass) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO day_passes (session_id, expires_at, payment_provider, transaction_ref, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id) DO UPDATE
            SET expires_at = EXCLUDED.expires_at,
                payment_provider = EXCLUDED.payment_provider,
                transaction_ref = EXCLUDED.transaction_ref
            WHERE day_passes.user_id IS NULL
            ",
        )
        .bind(pass.session_id.0)
        .bind(pass.expires_at)
        .bind(pass.payment_provider.as_str())
        .bind(pass.transaction_ref.as_deref())
        .bind(pass.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::Database(format!("Failed to write day pass: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_merged(
        &self,
        session_id: AnonymousSessionId,
        user_id: UserId,
        merged_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE day_passes
            SET user_id = $2, merged_at = $3
            WHERE session_id = $1 AND user_id IS NULL
            ",
        )
        .bind(session_id.0)
        .bind(user_id.0)
        .bind(merged_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::Database(format!("Failed to mark day pass merged: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
