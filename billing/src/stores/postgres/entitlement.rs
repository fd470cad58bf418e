//! PostgreSQL entitlement store.
//!
//! Entitlements live as columns on the `profiles` table. Every write sets all
//! of them, so the other provider's refs are nulled.
//!
//! # Example
//!
//! ```no_run
//! use comicvault_billing::stores::postgres::PostgresEntitlementStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/comicvault").await?;
//! let store = PostgresEntitlementStore::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::{BillingError, Result};
use crate::providers::EntitlementStore;
use crate::state::{
    Entitlement, EntitlementStatus, PaymentProvider, ProviderReference, ProviderRefs, Tier, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL entitlement store.
#[derive(Clone)]
pub struct PostgresEntitlementStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresEntitlementStore {
    /// Create a new store.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EntitlementRow {
    subscription_tier: String,
    subscription_status: String,
    subscription_expires_at: Option<DateTime<Utc>>,
    payment_provider: String,
    paypal_order_id: Option<String>,
    paypal_subscription_id: Option<String>,
    paystack_reference: Option<String>,
    paystack_subscription_code: Option<String>,
    paystack_customer_code: Option<String>,
}

impl TryFrom<EntitlementRow> for Entitlement {
    type Error = BillingError;

    fn try_from(row: EntitlementRow) -> Result<Self> {
        let refs = match row.payment_provider.parse::<PaymentProvider>()? {
            PaymentProvider::None => ProviderRefs::None,
            PaymentProvider::PayPal => ProviderRefs::PayPal {
                order_id: row.paypal_order_id,
                subscription_id: row.paypal_subscription_id,
            },
            PaymentProvider::Paystack => ProviderRefs::Paystack {
                reference: row.paystack_reference,
                subscription_code: row.paystack_subscription_code,
                customer_code: row.paystack_customer_code,
            },
        };

        Ok(Self {
            tier: row.subscription_tier.parse::<Tier>()?,
            status: row.subscription_status.parse::<EntitlementStatus>()?,
            expires_at: row.subscription_expires_at,
            refs,
        })
    }
}

/// Flattened refs, one slot per column.
#[derive(Default)]
struct RefColumns {
    paypal_order_id: Option<String>,
    paypal_subscription_id: Option<String>,
    paystack_reference: Option<String>,
    paystack_subscription_code: Option<String>,
    paystack_customer_code: Option<String>,
}

impl From<&ProviderRefs> for RefColumns {
    fn from(refs: &ProviderRefs) -> Self {
        match refs.clone() {
            ProviderRefs::None => Self::default(),
            ProviderRefs::PayPal {
                order_id,
                subscription_id,
            } => Self {
                paypal_order_id: order_id,
                paypal_subscription_id: subscription_id,
                ..Self::default()
            },
            ProviderRefs::Paystack {
                reference,
                subscription_code,
                customer_code,
            } => Self {
                paystack_reference: reference,
                paystack_subscription_code: subscription_code,
                paystack_customer_code: customer_code,
                ..Self::default()
            },
        }
    }
}

impl EntitlementStore for PostgresEntitlementStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Entitlement>> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r"
            SELECT subscription_tier, subscription_status, subscription_expires_at,
                   payment_provider, paypal_order_id, paypal_subscription_id,
                   paystack_reference, paystack_subscription_code, paystack_customer_code
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::Database(format!("Failed to get entitlement: {e}")))?;

        row.map(Entitlement::try_from).transpose()
    }

    async fn replace(&self, user_id: UserId, entitlement: &Entitlement) -> Result<()> {
        let columns = RefColumns::from(&entitlement.refs);

        let result = sqlx::query(
            r"
            UPDATE profiles
            SET subscription_tier = $2,
                subscription_status = $3,
                subscription_expires_at = $4,
                payment_provider = $5,
                paypal_order_id = $6,
                paypal_subscription_id = $7,
                paystack_reference = $8,
                paystack_subscription_code = $9,
                paystack_customer_code = $10,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(user_id.0)
        .bind(entitlement.tier.as_str())
        .bind(entitlement.status.as_str())
        .bind(entitlement.expires_at)
        .bind(entitlement.payment_provider().as_str())
        .bind(columns.paypal_order_id)
        .bind(columns.paypal_subscription_id)
        .bind(columns.paystack_reference)
        .bind(columns.paystack_subscription_code)
        .bind(columns.paystack_customer_code)
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::Database(format!("Failed to write entitlement: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::SubjectNotFound);
        }

        Ok(())
    }

    async fn find_user_by_reference(&self, reference: &ProviderReference) -> Result<Option<UserId>> {
        let sql = match reference {
            ProviderReference::PayPalOrder(_) => {
                "SELECT id FROM profiles WHERE paypal_order_id = $1 LIMIT 1"
            }
            ProviderReference::PayPalSubscription(_) => {
                "SELECT id FROM profiles WHERE paypal_subscription_id = $1 LIMIT 1"
            }
            ProviderReference::PaystackReference(_) => {
                "SELECT id FROM profiles WHERE paystack_reference = $1 LIMIT 1"
            }
            ProviderReference::PaystackSubscription(_) => {
                "SELECT id FROM profiles WHERE paystack_subscription_code = $1 LIMIT 1"
            }
            ProviderReference::PaystackCustomer(_) => {
                "SELECT id FROM profiles WHERE paystack_customer_code = $1 LIMIT 1"
            }
        };

        let id: Option<uuid::Uuid> = sqlx::query_scalar(sql)
            .bind(reference.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BillingError::Database(format!("Failed to look up reference: {e}")))?;

        Ok(id.map(UserId))
    }
}
