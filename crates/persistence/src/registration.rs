//! Wiring the persistence layer into a [`ServiceCollection`].

use std::sync::Arc;

use tracing::info;

use ecommerce_customers::{AddressKind, Customer};
use ecommerce_orders::Order;
use ecommerce_products::Product;

use crate::config::{AppSettings, POSTGRESQL};
use crate::context::EcommerceDbContext;
use crate::error::PersistenceResult;
use crate::in_memory::{InMemoryAddressSet, InMemorySet};
use crate::services::ServiceCollection;
use crate::set::{AddressQueries, EntitySet};

/// Name under which the billing-only address view is registered.
pub const BILLING_ADDRESSES: &str = "billing";

/// Name under which the shipping-only address view is registered.
pub const SHIPPING_ADDRESSES: &str = "shipping";

pub trait PersistenceServiceCollectionExt {
    /// Register the Postgres context and its sets, using the `postgresql`
    /// connection string from `settings`.
    ///
    /// The pool is lazy: registration succeeds without a reachable database.
    fn add_persistence_services(&self, settings: &AppSettings) -> PersistenceResult<&Self>;

    /// Register an already built context and its sets.
    fn add_persistence_context(&self, context: EcommerceDbContext) -> &Self;

    /// Register in-memory sets under the same service types.
    fn add_in_memory_persistence_services(&self) -> &Self;
}

impl PersistenceServiceCollectionExt for ServiceCollection {
    fn add_persistence_services(&self, settings: &AppSettings) -> PersistenceResult<&Self> {
        let connection_string = settings.require_connection_string(POSTGRESQL)?;
        let context = EcommerceDbContext::connect_lazy(connection_string, &settings.database)?;

        Ok(self.add_persistence_context(context))
    }

    fn add_persistence_context(&self, context: EcommerceDbContext) -> &Self {
        self.register::<dyn EntitySet<Customer>>(Arc::new(context.customers()))
            .register::<dyn EntitySet<Order>>(Arc::new(context.orders()))
            .register::<dyn EntitySet<Product>>(Arc::new(context.products()))
            .register::<dyn AddressQueries>(Arc::new(context.addresses()))
            .register_named::<dyn AddressQueries>(
                BILLING_ADDRESSES,
                Arc::new(context.billing_addresses()),
            )
            .register_named::<dyn AddressQueries>(
                SHIPPING_ADDRESSES,
                Arc::new(context.shipping_addresses()),
            )
            .register(Arc::new(context));

        info!(backend = "postgres", "persistence services registered");
        self
    }

    fn add_in_memory_persistence_services(&self) -> &Self {
        let customers = Arc::new(InMemorySet::<Customer>::new());

        self.register::<dyn EntitySet<Customer>>(customers.clone())
            .register::<dyn EntitySet<Order>>(Arc::new(InMemorySet::<Order>::new()))
            .register::<dyn EntitySet<Product>>(Arc::new(InMemorySet::<Product>::new()))
            .register::<dyn AddressQueries>(Arc::new(InMemoryAddressSet::new(customers.clone())))
            .register_named::<dyn AddressQueries>(
                BILLING_ADDRESSES,
                Arc::new(InMemoryAddressSet::of_kind(
                    customers.clone(),
                    AddressKind::Billing,
                )),
            )
            .register_named::<dyn AddressQueries>(
                SHIPPING_ADDRESSES,
                Arc::new(InMemoryAddressSet::of_kind(customers, AddressKind::Shipping)),
            );

        info!(backend = "in-memory", "persistence services registered");
        self
    }
}
