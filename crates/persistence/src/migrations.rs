//! Embedded schema migrations.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{info, instrument};

use crate::error::{PersistenceResult, map_sqlx_error};

/// Migrations from `crates/persistence/migrations`, compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A known migration and whether the database has applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply every pending migration.
#[instrument(skip(pool), err)]
pub async fn run_migrations(pool: &PgPool) -> PersistenceResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.iter().count(), "database schema is up to date");
    Ok(())
}

/// List the embedded migrations with their applied state.
#[instrument(skip(pool), err)]
pub async fn migration_status(pool: &PgPool) -> PersistenceResult<Vec<MigrationStatus>> {
    let applied = applied_versions(pool).await?;

    Ok(MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}

async fn applied_versions(pool: &PgPool) -> PersistenceResult<HashSet<i64>> {
    // Fresh database: the bookkeeping table does not exist yet.
    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .map_err(|e| map_sqlx_error("migration_status", e))?;
    if !table_exists {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(pool)
            .await
            .map_err(|e| map_sqlx_error("migration_status", e))?;
    Ok(versions.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_schema_is_embedded() {
        let migrations: Vec<_> = MIGRATOR.iter().collect();
        assert!(!migrations.is_empty());
        assert_eq!(migrations[0].description, "initial schema");
    }
}
