use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use ecommerce_core::{AddressId, CustomerId};
use ecommerce_customers::{Address, AddressKind};

use crate::error::{PersistenceResult, map_sqlx_error};
use crate::model::TableMapping;
use crate::rows::AddressRow;
use crate::set::{AddressQueries, DeletedFilter};

/// Address view over the `addresses` table, optionally limited to one `address_type`.
#[derive(Debug, Clone)]
pub struct PgAddressSet {
    pool: PgPool,
    kind: Option<AddressKind>,
}

impl PgAddressSet {
    /// All addresses regardless of type.
    pub fn new(pool: PgPool) -> Self {
        Self { pool, kind: None }
    }

    pub fn of_kind(pool: PgPool, kind: AddressKind) -> Self {
        Self {
            pool,
            kind: Some(kind),
        }
    }

    fn kind_param(&self) -> Option<&'static str> {
        self.kind.map(AddressKind::as_str)
    }
}

/// Load the addresses of the given customers (any type), honouring `filter`.
pub(crate) async fn fetch_for_customers(
    pool: &PgPool,
    customer_ids: &[Uuid],
    filter: DeletedFilter,
) -> PersistenceResult<Vec<AddressRow>> {
    let sql = AddressRow::select_where("customer_id = ANY($1)", filter);
    sqlx::query_as::<_, AddressRow>(&sql)
        .bind(customer_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("load_customer_addresses", e))
}

fn into_addresses(rows: Vec<AddressRow>) -> PersistenceResult<Vec<Address>> {
    rows.into_iter().map(AddressRow::into_address).collect()
}

#[async_trait]
impl AddressQueries for PgAddressSet {
    fn kind(&self) -> Option<AddressKind> {
        self.kind
    }

    #[instrument(skip(self), fields(address_id = %id, kind = ?self.kind), err)]
    async fn find(
        &self,
        id: AddressId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Option<Address>> {
        let sql = AddressRow::select_where(
            "id = $1 AND ($2::text IS NULL OR address_type = $2)",
            filter,
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(*id.as_uuid())
            .bind(self.kind_param())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_address", e))?;

        row.map(AddressRow::into_address).transpose()
    }

    #[instrument(skip(self), fields(kind = ?self.kind), err)]
    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Address>> {
        let sql = AddressRow::select_where("$1::text IS NULL OR address_type = $1", filter);
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(self.kind_param())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_addresses", e))?;

        into_addresses(rows)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, kind = ?self.kind), err)]
    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Vec<Address>> {
        let sql = AddressRow::select_where(
            "customer_id = $1 AND ($2::text IS NULL OR address_type = $2)",
            filter,
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(*customer_id.as_uuid())
            .bind(self.kind_param())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customer_addresses", e))?;

        into_addresses(rows)
    }
}
