//! Persistence layer: PostgreSQL context and entity sets, configuration,
//! migrations, service registration and design-time context construction.

pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod in_memory;
pub mod migrations;
pub mod model;
pub mod postgres;
pub mod registration;
pub mod rows;
pub mod services;
pub mod set;

pub use config::{AppSettings, DatabaseOptions, POSTGRESQL};
pub use context::EcommerceDbContext;
pub use error::{PersistenceError, PersistenceResult};
pub use factory::{DesignTimeContextFactory, EcommerceContextFactory, ENVIRONMENT_VARIABLE};
pub use in_memory::{InMemoryAddressSet, InMemorySet};
pub use migrations::{MigrationStatus, run_migrations, migration_status};
pub use registration::{BILLING_ADDRESSES, PersistenceServiceCollectionExt, SHIPPING_ADDRESSES};
pub use services::{ServiceCollection, ServiceError};
pub use set::{AddressQueries, DeletedFilter, EntitySet};
