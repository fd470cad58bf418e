//! Storage implementations.
//!
//! - **Entitlement Store** (PostgreSQL) - entitlement columns on `profiles`
//! - **Day Pass Store** (PostgreSQL) - `day_passes`, one row per anonymous session

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresDayPassStore, PostgresEntitlementStore};
