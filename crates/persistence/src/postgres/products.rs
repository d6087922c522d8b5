use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use ecommerce_core::{Entity, OrderId, ProductId};
use ecommerce_products::Product;

use crate::error::{PersistenceError, PersistenceResult, map_sqlx_error};
use crate::model::TableMapping;
use crate::rows::ProductRow;
use crate::set::{DeletedFilter, EntitySet};

use super::group_pairs;

/// Products; their order ids come from the `order_products` join table.
#[derive(Debug, Clone)]
pub struct PgProductSet {
    pool: PgPool,
}

impl PgProductSet {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_graphs(
        &self,
        rows: Vec<ProductRow>,
        filter: DeletedFilter,
    ) -> PersistenceResult<Vec<Product>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let pairs: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT op.product_id, op.order_id
            FROM order_products op
            JOIN orders o ON o.id = op.order_id
            WHERE op.product_id = ANY($1) AND ($2 OR NOT o.is_deleted)
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(&ids)
        .bind(filter.includes_deleted())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_product_orders", e))?;
        let mut orders = group_pairs(
            pairs
                .into_iter()
                .map(|(product_id, order_id)| (product_id, OrderId::from_uuid(order_id))),
        );

        rows.into_iter()
            .map(|row| {
                let order_ids = orders.remove(&row.id).unwrap_or_default();
                row.into_product(order_ids)
            })
            .collect()
    }
}

#[async_trait]
impl EntitySet<Product> for PgProductSet {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find(
        &self,
        id: ProductId,
        filter: DeletedFilter,
    ) -> PersistenceResult<Option<Product>> {
        let sql = ProductRow::select_by_id(filter);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        match row {
            Some(row) => Ok(self.load_graphs(vec![row], filter).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Product>> {
        let sql = ProductRow::select_all(filter);
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        self.load_graphs(rows, filter).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn add(&self, product: &Product) -> PersistenceResult<()> {
        let row = ProductRow::from_product(product)?;
        let sql = ProductRow::insert_sql();
        row.bind_columns(sqlx::query(&sql))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn update(&self, product: &Product) -> PersistenceResult<()> {
        let row = ProductRow::from_product(product)?;
        let sql = ProductRow::update_sql();
        let result = row
            .bind_columns(sqlx::query(&sql))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found(format!(
                "product {}",
                product.id()
            )));
        }
        Ok(())
    }
}
