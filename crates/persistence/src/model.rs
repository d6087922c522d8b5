//! Declarative relational model.
//!
//! Every row type names its table and column list once; SQL statements are
//! derived from that description. Columns are bound in declaration order, and
//! the first column is always the primary key `id`.
//!
//! | Table | Keys | Notes |
//! |-------|------|-------|
//! | `customers` | `id` | |
//! | `addresses` | `id`, FK `customer_id` (cascade) | `address_type` discriminator: `billing` / `shipping` |
//! | `products` | `id` | `price NUMERIC(18,2)`, `stock_quantity >= 0` |
//! | `orders` | `id`, FK `customer_id` (restrict) | `total_amount NUMERIC(18,2)` |
//! | `order_products` | (`order_id`, `product_id`) | join table, `position` keeps insertion order |

use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

use crate::set::DeletedFilter;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub trait TableMapping {
    const TABLE: &'static str;

    /// All columns, `id` first, audit columns last.
    const COLUMNS: &'static [&'static str];

    /// Bind every column value in [`COLUMNS`](Self::COLUMNS) order.
    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;

    /// `SELECT <columns> FROM <table> WHERE <condition>` plus the soft-delete
    /// predicate, ordered by creation.
    fn select_where(condition: &str, filter: DeletedFilter) -> String {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE ({condition})",
            Self::COLUMNS.join(", "),
            Self::TABLE
        );
        if !filter.includes_deleted() {
            sql.push_str(" AND NOT is_deleted");
        }
        sql.push_str(" ORDER BY created_at, id");
        sql
    }

    fn select_all(filter: DeletedFilter) -> String {
        Self::select_where("TRUE", filter)
    }

    fn select_by_id(filter: DeletedFilter) -> String {
        Self::select_where("id = $1", filter)
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=Self::COLUMNS.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    /// `UPDATE ... SET` every non-key column, keyed on `id = $1`.
    fn update_sql() -> String {
        let assignments: Vec<String> = Self::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE id = $1",
            Self::TABLE,
            assignments.join(", ")
        )
    }

    /// Insert-or-update on the primary key.
    fn upsert_sql() -> String {
        let assignments: Vec<String> = Self::COLUMNS
            .iter()
            .skip(1)
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect();
        format!(
            "{} ON CONFLICT (id) DO UPDATE SET {}",
            Self::insert_sql(),
            assignments.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        id: uuid::Uuid,
        name: String,
        is_deleted: bool,
    }

    impl TableMapping for Widget {
        const TABLE: &'static str = "widgets";
        const COLUMNS: &'static [&'static str] = &["id", "name", "is_deleted"];

        fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
            query.bind(self.id).bind(self.name.as_str()).bind(self.is_deleted)
        }
    }

    #[test]
    fn select_applies_soft_delete_filter() {
        assert_eq!(
            Widget::select_by_id(DeletedFilter::ExcludeDeleted),
            "SELECT id, name, is_deleted FROM widgets WHERE (id = $1) AND NOT is_deleted ORDER BY created_at, id"
        );
        assert_eq!(
            Widget::select_all(DeletedFilter::IncludeDeleted),
            "SELECT id, name, is_deleted FROM widgets WHERE (TRUE) ORDER BY created_at, id"
        );
    }

    #[test]
    fn write_statements_follow_column_order() {
        assert_eq!(
            Widget::insert_sql(),
            "INSERT INTO widgets (id, name, is_deleted) VALUES ($1, $2, $3)"
        );
        assert_eq!(
            Widget::update_sql(),
            "UPDATE widgets SET name = $2, is_deleted = $3 WHERE id = $1"
        );
        assert_eq!(
            Widget::upsert_sql(),
            "INSERT INTO widgets (id, name, is_deleted) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, is_deleted = EXCLUDED.is_deleted"
        );
    }

    #[test]
    fn bind_columns_is_usable_with_generated_sql() {
        let widget = Widget {
            id: uuid::Uuid::nil(),
            name: "w".into(),
            is_deleted: false,
        };
        let sql = Widget::insert_sql();
        let _query = widget.bind_columns(sqlx::query(&sql));
    }
}
