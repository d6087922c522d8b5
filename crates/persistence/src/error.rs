//! Persistence error model.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `PersistenceError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | PersistenceError | Scenario |
//! |------------|----------------------|------------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Entity id (or join row) already stored |
//! | Database (foreign key violation) | `23503` | `InvalidReference` | Order points to an unknown customer or product |
//! | Database (other) | Any other | `Database` | Check constraints, syntax, permissions |
//! | PoolClosed / Io / Tls / other | N/A | `Database` | Connection failures |

use thiserror::Error;

use ecommerce_core::DomainError;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PersistenceError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<figment::Error> for PersistenceError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PersistenceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}

/// Map a SQLx error raised by `operation` onto the persistence error model.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());

            match db_err.code().as_deref() {
                Some("23505") => PersistenceError::Conflict(msg),
                Some("23503") => PersistenceError::InvalidReference(msg),
                _ => PersistenceError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            PersistenceError::Database(format!("connection pool closed in {operation}"))
        }
        _ => PersistenceError::Database(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_database() {
        let err = map_sqlx_error("load_customer", sqlx::Error::PoolClosed);
        assert!(matches!(err, PersistenceError::Database(msg) if msg.contains("load_customer")));
    }

    #[test]
    fn row_not_found_maps_to_database() {
        let err = map_sqlx_error("update_product", sqlx::Error::RowNotFound);
        assert!(matches!(err, PersistenceError::Database(_)));
    }

    #[test]
    fn domain_errors_pass_through() {
        let err: PersistenceError = DomainError::validation("name cannot be empty").into();
        assert_eq!(err.to_string(), "validation failed: name cannot be empty");
    }
}
