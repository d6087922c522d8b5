use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use ecommerce_core::{CustomerId, Entity, OrderId};
use ecommerce_customers::Customer;

use crate::error::{PersistenceError, PersistenceResult, map_sqlx_error};
use crate::model::TableMapping;
use crate::rows::{AddressRow, CustomerRow};
use crate::set::{DeletedFilter, EntitySet};

use super::addresses::fetch_for_customers;
use super::group_pairs;

/// Customers together with their owned addresses.
///
/// Order ids are read from `orders.customer_id`; orders themselves are written
/// through [`PgOrderSet`](super::PgOrderSet).
#[derive(Debug, Clone)]
pub struct PgCustomerSet {
    pool: PgPool,
}

impl PgCustomerSet {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_graphs(
        &self,
        rows: Vec<CustomerRow>,
        filter: DeletedFilter,
    ) -> PersistenceResult<Vec<Customer>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let mut addresses = group_pairs(
            fetch_for_customers(&self.pool, &ids, filter)
                .await?
                .into_iter()
                .map(|row| (row.customer_id, row)),
        );

        let order_pairs: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT customer_id, id
            FROM orders
            WHERE customer_id = ANY($1) AND ($2 OR NOT is_deleted)
            ORDER BY created_at, id
            "#,
        )
        .bind(&ids)
        .bind(filter.includes_deleted())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_customer_orders", e))?;
        let mut orders = group_pairs(
            order_pairs
                .into_iter()
                .map(|(customer_id, order_id)| (customer_id, OrderId::from_uuid(order_id))),
        );

        rows.into_iter()
            .map(|row| {
                let owned = addresses
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(AddressRow::into_address)
                    .collect::<PersistenceResult<Vec<_>>>()?;
                let order_ids = orders.remove(&row.id).unwrap_or_default();
                row.into_customer(owned, order_ids)
            })
            .collect()
    }
}

fn address_rows(customer: &Customer) -> PersistenceResult<Vec<AddressRow>> {
    customer
        .addresses()
        .iter()
        .map(AddressRow::from_address)
        .collect()
}

async fn begin(pool: &PgPool) -> PersistenceResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))
}

#[async_trait]
impl EntitySet<Customer> for PgCustomerSet {
    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn find(
        &self,
        id: CustomerId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Option<Customer>> {
        let sql = CustomerRow::select_by_id(filter);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer", e))?;

        match row {
            Some(row) => Ok(self.load_graphs(vec![row], filter).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Customer>> {
        let sql = CustomerRow::select_all(filter);
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customers", e))?;

        self.load_graphs(rows, filter).await
    }

    #[instrument(
        skip(self, customer),
        fields(customer_id = %customer.id(), address_count = customer.addresses().len()),
        err
    )]
    async fn add(&self, customer: &Customer) -> PersistenceResult<()> {
        let row = CustomerRow::from(customer);
        let addresses = address_rows(customer)?;

        let mut tx = begin(&self.pool).await?;

        let sql = CustomerRow::insert_sql();
        row.bind_columns(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_customer", e))?;

        let address_sql = AddressRow::insert_sql();
        for address in &addresses {
            address
                .bind_columns(sqlx::query(&address_sql))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_address", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    #[instrument(
        skip(self, customer),
        fields(customer_id = %customer.id(), address_count = customer.addresses().len()),
        err
    )]
    async fn update(&self, customer: &Customer) -> PersistenceResult<()> {
        let row = CustomerRow::from(customer);
        let addresses = address_rows(customer)?;

        let mut tx = begin(&self.pool).await?;

        let sql = CustomerRow::update_sql();
        let result = row
            .bind_columns(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_customer", e))?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found(format!(
                "customer {}",
                customer.id()
            )));
        }

        // New addresses are inserted, known ones overwritten. An address id owned by
        // another customer matches no row in the conditional update.
        let address_sql = format!(
            "{} WHERE {table}.customer_id = EXCLUDED.customer_id",
            AddressRow::upsert_sql(),
            table = AddressRow::TABLE
        );
        for address in &addresses {
            let result = address
                .bind_columns(sqlx::query(&address_sql))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("upsert_address", e))?;
            if result.rows_affected() == 0 {
                return Err(PersistenceError::Conflict(format!(
                    "address {} belongs to another customer",
                    address.id
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}
