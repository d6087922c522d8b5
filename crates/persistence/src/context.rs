//! The persistence context: one pool, one set per entity.

use sqlx::PgPool;
use tracing::{debug, instrument};

use ecommerce_customers::AddressKind;

use crate::config::DatabaseOptions;
use crate::error::{PersistenceError, PersistenceResult, map_sqlx_error};
use crate::migrations::{self, MigrationStatus};
use crate::postgres::{PgAddressSet, PgCustomerSet, PgOrderSet, PgProductSet};

/// Entry point to the relational store.
///
/// Cheap to clone; every clone shares the same connection pool.
#[derive(Debug, Clone)]
pub struct EcommerceDbContext {
    pool: PgPool,
}

impl EcommerceDbContext {
    /// Build a context whose pool connects on first use.
    ///
    /// Only the connection string is parsed here; no connection is attempted.
    /// The pool spawns its maintenance tasks on the current Tokio runtime, so
    /// calling this outside one is a `Configuration` error.
    pub fn connect_lazy(
        connection_string: &str,
        options: &DatabaseOptions,
    ) -> PersistenceResult<Self> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(PersistenceError::configuration(
                "a Tokio runtime is required to create the connection pool",
            ));
        }

        let pool = options
            .pool_options()
            .connect_lazy(connection_string)
            .map_err(|e| {
                PersistenceError::configuration(format!("invalid connection string: {e}"))
            })?;

        debug!(
            max_connections = options.max_connections,
            min_connections = options.min_connections,
            "created lazy connection pool"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn customers(&self) -> PgCustomerSet {
        PgCustomerSet::new(self.pool.clone())
    }

    pub fn orders(&self) -> PgOrderSet {
        PgOrderSet::new(self.pool.clone())
    }

    pub fn products(&self) -> PgProductSet {
        PgProductSet::new(self.pool.clone())
    }

    /// Every address, billing and shipping alike.
    pub fn addresses(&self) -> PgAddressSet {
        PgAddressSet::new(self.pool.clone())
    }

    pub fn billing_addresses(&self) -> PgAddressSet {
        PgAddressSet::of_kind(self.pool.clone(), AddressKind::Billing)
    }

    pub fn shipping_addresses(&self) -> PgAddressSet {
        PgAddressSet::of_kind(self.pool.clone(), AddressKind::Shipping)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> PersistenceResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn migration_status(&self) -> PersistenceResult<Vec<MigrationStatus>> {
        migrations::migration_status(&self.pool).await
    }

    /// Round-trip a trivial query to verify connectivity.
    #[instrument(skip(self), err)]
    pub async fn ping(&self) -> PersistenceResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}
