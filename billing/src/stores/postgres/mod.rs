//! PostgreSQL storage implementations.
//!
//! Queries are built at runtime (`sqlx::query_as` + `bind`), so no database is
//! needed at compile time.

pub mod day_pass;
pub mod entitlement;

pub use day_pass::PostgresDayPassStore;
pub use entitlement::PostgresEntitlementStore;

use crate::error::{BillingError, Result};
use sqlx::PgPool;

/// Run the billing migrations (`billing/migrations`).
///
/// # Errors
///
/// Returns error if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| BillingError::Database(format!("Migration failed: {e}")))?;
    Ok(())
}
