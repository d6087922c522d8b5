use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use ecommerce_core::{Entity, OrderId, ProductId};
use ecommerce_orders::Order;

use crate::error::{PersistenceError, PersistenceResult, map_sqlx_error};
use crate::model::TableMapping;
use crate::rows::OrderRow;
use crate::set::{DeletedFilter, EntitySet};

use super::group_pairs;

/// Orders and their `order_products` join rows.
#[derive(Debug, Clone)]
pub struct PgOrderSet {
    pool: PgPool,
}

impl PgOrderSet {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach product ids to `rows`.
    ///
    /// Every join row is loaded, including rows pointing at soft-deleted products:
    /// the product list is part of the order, and `update` writes back exactly
    /// what was read.
    async fn load_graphs(&self, rows: Vec<OrderRow>) -> PersistenceResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let pairs: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT order_id, product_id
            FROM order_products
            WHERE order_id = ANY($1)
            ORDER BY order_id, position, product_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_products", e))?;
        let mut products = group_pairs(
            pairs
                .into_iter()
                .map(|(order_id, product_id)| (order_id, ProductId::from_uuid(product_id))),
        );

        rows.into_iter()
            .map(|row| {
                let product_ids = products.remove(&row.id).unwrap_or_default();
                row.into_order(product_ids)
            })
            .collect()
    }
}

/// Write the join rows for `order`, positions following the order's product list.
/// Rows for products that are no longer listed are removed.
async fn save_order_products(conn: &mut PgConnection, order: &Order) -> PersistenceResult<()> {
    let order_id = *order.id().as_uuid();
    let product_ids: Vec<Uuid> = order.product_ids().iter().map(|p| *p.as_uuid()).collect();

    sqlx::query(
        r#"
        DELETE FROM order_products
        WHERE order_id = $1
          AND NOT (product_id = ANY($2))
        "#,
    )
    .bind(order_id)
    .bind(&product_ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("prune_order_products", e))?;

    for (position, product_id) in product_ids.iter().enumerate() {
        let position = i32::try_from(position).map_err(|_| {
            PersistenceError::Database(format!("order {order_id} has too many products"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO order_products (order_id, product_id, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id, product_id) DO UPDATE SET position = EXCLUDED.position
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(position)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("save_order_product", e))?;
    }

    Ok(())
}

#[async_trait]
impl EntitySet<Order> for PgOrderSet {
    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn find(&self, id: OrderId, filter: DeletedFilter) -> PersistenceResult<Option<Order>> {
        let sql = OrderRow::select_by_id(filter);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_order", e))?;

        match row {
            Some(row) => Ok(self.load_graphs(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: DeletedFilter) -> PersistenceResult<Vec<Order>> {
        let sql = OrderRow::select_all(filter);
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;

        self.load_graphs(rows).await
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id(), customer_id = %order.customer_id(), product_count = order.product_ids().len()),
        err
    )]
    async fn add(&self, order: &Order) -> PersistenceResult<()> {
        let row = OrderRow::from(order);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let sql = OrderRow::insert_sql();
        row.bind_columns(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        save_order_products(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id(), product_count = order.product_ids().len()),
        err
    )]
    async fn update(&self, order: &Order) -> PersistenceResult<()> {
        let row = OrderRow::from(order);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let sql = OrderRow::update_sql();
        let result = row
            .bind_columns(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found(format!("order {}", order.id())));
        }

        save_order_products(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}
