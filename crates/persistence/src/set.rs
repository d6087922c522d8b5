//! Entity set abstractions.
//!
//! A set is the queryable/persistable collection of one entity type. Soft-deleted
//! rows are hidden unless a query opts in with [`DeletedFilter::IncludeDeleted`];
//! rows are never physically removed (delete = `mark_as_deleted()` + `update`).

use std::sync::Arc;

use async_trait::async_trait;

use ecommerce_core::{AddressId, AuditedEntity, CustomerId, Entity};
use ecommerce_customers::{Address, AddressKind};

use crate::error::{PersistenceError, PersistenceResult};

/// Query-level soft-delete filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedFilter {
    #[default]
    ExcludeDeleted,
    IncludeDeleted,
}

impl DeletedFilter {
    pub fn includes_deleted(self) -> bool {
        matches!(self, DeletedFilter::IncludeDeleted)
    }

    /// Whether an entity with the given flag passes this filter.
    pub fn admits(self, is_deleted: bool) -> bool {
        self.includes_deleted() || !is_deleted
    }
}

/// Persisted collection of one entity type.
#[async_trait]
pub trait EntitySet<E>: Send + Sync
where
    E: AuditedEntity + Send + Sync + 'static,
{
    async fn find(&self, id: E::Id, filter: DeletedFilter) -> PersistenceResult<Option<E>>;

    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<E>>;

    /// Insert a new entity. An entity with the same id already stored is a `Conflict`.
    async fn add(&self, entity: &E) -> PersistenceResult<()>;

    /// Overwrite a stored entity. Unknown ids are `NotFound`.
    async fn update(&self, entity: &E) -> PersistenceResult<()>;

    /// Like [`find`](Self::find) with the default filter, but a missing entity is an error.
    async fn get(&self, id: E::Id) -> PersistenceResult<E> {
        self.find(id, DeletedFilter::ExcludeDeleted)
            .await?
            .ok_or_else(|| PersistenceError::not_found(format!("{id:?}")))
    }
}

#[async_trait]
impl<E, S> EntitySet<E> for Arc<S>
where
    E: AuditedEntity + Send + Sync + 'static,
    S: EntitySet<E> + ?Sized,
{
    async fn find(&self, id: E::Id, filter: DeletedFilter) -> PersistenceResult<Option<E>> {
        (**self).find(id, filter).await
    }

    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<E>> {
        (**self).list(filter).await
    }

    async fn add(&self, entity: &E) -> PersistenceResult<()> {
        (**self).add(entity).await
    }

    async fn update(&self, entity: &E) -> PersistenceResult<()> {
        (**self).update(entity).await
    }
}

/// Read access to addresses, optionally narrowed to one [`AddressKind`].
///
/// Addresses are written through their owning customer.
#[async_trait]
pub trait AddressQueries: Send + Sync {
    /// The kind this view is restricted to, `None` for all addresses.
    fn kind(&self) -> Option<AddressKind>;

    async fn find(&self, id: AddressId, filter: DeletedFilter)
    -> PersistenceResult<Option<Address>>;

    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Address>>;

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Vec<Address>>;
}

/// Shared `kind` + soft-delete check used by address query implementations.
pub(crate) fn address_matches(
    scope: Option<AddressKind>,
    filter: DeletedFilter,
    address: &Address,
) -> bool {
    scope.is_none_or(|kind| address.kind() == kind) && filter.admits(address.is_deleted())
}

pub(crate) fn entity_label<E: Entity>(entity: &E) -> String {
    format!("{:?}", entity.id())
}
