//! In-memory entity sets for tests and local development.
//!
//! Same contracts as the Postgres sets (soft-delete filter, `Conflict` on duplicate
//! add, `NotFound` on unknown update). Navigation ids are stored exactly as saved;
//! nothing is derived from other sets.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use ecommerce_core::{AddressId, AuditedEntity, CustomerId, Entity};
use ecommerce_customers::{Address, AddressKind, Customer};

use crate::error::{PersistenceError, PersistenceResult};
use crate::set::{AddressQueries, DeletedFilter, EntitySet, address_matches, entity_label};

/// Insertion-ordered in-memory set.
#[derive(Debug)]
pub struct InMemorySet<E> {
    entries: RwLock<Vec<E>>,
}

impl<E> InMemorySet<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<E> Default for InMemorySet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> InMemorySet<E> {
    /// Clone of every stored entity, deleted ones included.
    pub fn snapshot(&self) -> Vec<E> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl<E> EntitySet<E> for InMemorySet<E>
where
    E: AuditedEntity + Clone + Send + Sync + 'static,
{
    async fn find(&self, id: E::Id, filter: DeletedFilter) -> PersistenceResult<Option<E>> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .find(|e| *e.id() == id && filter.admits(e.is_deleted()))
            .cloned())
    }

    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<E>> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .filter(|e| filter.admits(e.is_deleted()))
            .cloned()
            .collect())
    }

    async fn add(&self, entity: &E) -> PersistenceResult<()> {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id() == entity.id()) {
            return Err(PersistenceError::Conflict(format!(
                "{} already exists",
                entity_label(entity)
            )));
        }
        entries.push(entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &E) -> PersistenceResult<()> {
        let mut entries = self.entries.write();
        let slot = entries
            .iter_mut()
            .find(|e| e.id() == entity.id())
            .ok_or_else(|| PersistenceError::not_found(entity_label(entity)))?;
        *slot = entity.clone();
        Ok(())
    }
}

/// Address view over the addresses owned by in-memory customers.
#[derive(Debug, Clone)]
pub struct InMemoryAddressSet {
    customers: Arc<InMemorySet<Customer>>,
    kind: Option<AddressKind>,
}

impl InMemoryAddressSet {
    pub fn new(customers: Arc<InMemorySet<Customer>>) -> Self {
        Self {
            customers,
            kind: None,
        }
    }

    pub fn of_kind(customers: Arc<InMemorySet<Customer>>, kind: AddressKind) -> Self {
        Self {
            customers,
            kind: Some(kind),
        }
    }

    fn collect(&self, filter: DeletedFilter, keep: impl Fn(&Address) -> bool) -> Vec<Address> {
        self.customers
            .entries
            .read()
            .iter()
            .flat_map(|c| c.addresses())
            .filter(|a| address_matches(self.kind, filter, a) && keep(a))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AddressQueries for InMemoryAddressSet {
    fn kind(&self) -> Option<AddressKind> {
        self.kind
    }

    async fn find(
        &self,
        id: AddressId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Option<Address>> {
        Ok(self.collect(filter, |a| *a.id() == id).into_iter().next())
    }

    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Address>> {
        Ok(self.collect(filter, |_| true))
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Vec<Address>> {
        Ok(self.collect(filter, |a| a.customer_id() == Some(customer_id)))
    }
}
