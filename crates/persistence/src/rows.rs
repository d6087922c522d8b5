//! Row types mirroring the tables, and their conversions to and from entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use ecommerce_core::{
    AddressId, AuditInfo, AuditedEntity, CustomerId, DomainError, Entity, OrderId, ProductId,
};
use ecommerce_customers::{Address, AddressKind, AddressLines, AddressRecord, Customer, CustomerRecord};
use ecommerce_orders::{Order, OrderRecord};
use ecommerce_products::{Product, ProductRecord};

use crate::error::PersistenceResult;
use crate::model::{PgQuery, TableMapping};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AuditColumns {
    pub created_at: DateTime<Utc>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl From<&AuditInfo> for AuditColumns {
    fn from(audit: &AuditInfo) -> Self {
        Self {
            created_at: audit.created_at(),
            last_modified_at: audit.last_modified_at(),
            is_deleted: audit.is_deleted(),
        }
    }
}

impl AuditColumns {
    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.created_at)
            .bind(self.last_modified_at)
            .bind(self.is_deleted)
    }

    fn into_audit(self) -> AuditInfo {
        AuditInfo::restore(self.created_at, self.last_modified_at, self.is_deleted)
    }
}

// customers

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

impl TableMapping for CustomerRow {
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "email",
        "created_at",
        "last_modified_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.id)
            .bind(self.first_name.as_str())
            .bind(self.last_name.as_str())
            .bind(self.email.as_str());
        self.audit.bind(query)
    }
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            id: *customer.id().as_uuid(),
            first_name: customer.first_name().to_string(),
            last_name: customer.last_name().to_string(),
            email: customer.email().to_string(),
            audit: customer.audit().into(),
        }
    }
}

impl CustomerRow {
    pub fn into_customer(
        self,
        addresses: Vec<Address>,
        order_ids: Vec<OrderId>,
    ) -> PersistenceResult<Customer> {
        let customer = Customer::from_record(CustomerRecord {
            id: CustomerId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            addresses,
            order_ids,
            audit: self.audit.into_audit(),
        })?;
        Ok(customer)
    }
}

// addresses

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address_type: String,
    pub building_no: String,
    pub building_name: String,
    pub street_line1: String,
    pub street_line2: Option<String>,
    pub neighbourhood: String,
    pub city: String,
    pub zip_code: String,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

impl TableMapping for AddressRow {
    const TABLE: &'static str = "addresses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "customer_id",
        "address_type",
        "building_no",
        "building_name",
        "street_line1",
        "street_line2",
        "neighbourhood",
        "city",
        "zip_code",
        "created_at",
        "last_modified_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.id)
            .bind(self.customer_id)
            .bind(self.address_type.as_str())
            .bind(self.building_no.as_str())
            .bind(self.building_name.as_str())
            .bind(self.street_line1.as_str())
            .bind(self.street_line2.as_deref())
            .bind(self.neighbourhood.as_str())
            .bind(self.city.as_str())
            .bind(self.zip_code.as_str());
        self.audit.bind(query)
    }
}

impl AddressRow {
    /// Addresses are only stored once attached to a customer.
    pub fn from_address(address: &Address) -> PersistenceResult<Self> {
        let customer_id = address.customer_id().ok_or_else(|| {
            DomainError::invariant(format!(
                "address {} is not attached to a customer",
                address.id()
            ))
        })?;
        let lines = address.lines();

        Ok(Self {
            id: *address.id().as_uuid(),
            customer_id: *customer_id.as_uuid(),
            address_type: address.kind().as_str().to_string(),
            building_no: lines.building_no().to_string(),
            building_name: lines.building_name().to_string(),
            street_line1: lines.street_line1().to_string(),
            street_line2: lines.street_line2().map(str::to_string),
            neighbourhood: lines.neighbourhood().to_string(),
            city: lines.city().to_string(),
            zip_code: lines.zip_code().to_string(),
            audit: address.audit().into(),
        })
    }

    pub fn into_address(self) -> PersistenceResult<Address> {
        let kind = self.address_type.parse::<AddressKind>()?;
        let lines = AddressLines::new(
            self.building_no,
            self.building_name,
            self.street_line1,
            self.street_line2,
            self.neighbourhood,
            self.city,
            self.zip_code,
        )?;

        Ok(Address::from_record(AddressRecord {
            id: AddressId::from_uuid(self.id),
            kind,
            lines,
            customer_id: CustomerId::from_uuid(self.customer_id),
            audit: self.audit.into_audit(),
        }))
    }
}

// products

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

impl TableMapping for ProductRow {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "price",
        "stock_quantity",
        "created_at",
        "last_modified_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.id)
            .bind(self.name.as_str())
            .bind(self.price)
            .bind(self.stock_quantity);
        self.audit.bind(query)
    }
}

impl ProductRow {
    pub fn from_product(product: &Product) -> PersistenceResult<Self> {
        let stock_quantity = i32::try_from(product.stock_quantity()).map_err(|_| {
            DomainError::validation(format!(
                "stock quantity {} exceeds the storable maximum {}",
                product.stock_quantity(),
                i32::MAX
            ))
        })?;

        Ok(Self {
            id: *product.id().as_uuid(),
            name: product.name().to_string(),
            price: product.price(),
            stock_quantity,
            audit: product.audit().into(),
        })
    }

    pub fn into_product(self, order_ids: Vec<OrderId>) -> PersistenceResult<Product> {
        let stock_quantity = u32::try_from(self.stock_quantity).map_err(|_| {
            DomainError::invariant(format!(
                "product {} has negative stock {}",
                self.id, self.stock_quantity
            ))
        })?;

        let product = Product::from_record(ProductRecord {
            id: ProductId::from_uuid(self.id),
            name: self.name,
            price: self.price,
            stock_quantity,
            order_ids,
            audit: self.audit.into_audit(),
        })?;
        Ok(product)
    }
}

// orders

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

impl TableMapping for OrderRow {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "customer_id",
        "total_amount",
        "created_at",
        "last_modified_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.id)
            .bind(self.customer_id)
            .bind(self.total_amount);
        self.audit.bind(query)
    }
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: *order.id().as_uuid(),
            customer_id: *order.customer_id().as_uuid(),
            total_amount: order.total_amount(),
            audit: order.audit().into(),
        }
    }
}

impl OrderRow {
    pub fn into_order(self, product_ids: Vec<ProductId>) -> PersistenceResult<Order> {
        let order = Order::from_record(OrderRecord {
            id: OrderId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            total_amount: self.total_amount,
            product_ids,
            audit: self.audit.into_audit(),
        })?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;

    fn lines() -> AddressLines {
        AddressLines::new("7", "", "Quay Street", None, "Harbour", "Bristol", "BS1").unwrap()
    }

    #[test]
    fn columns_match_bound_values() {
        assert_eq!(CustomerRow::COLUMNS.len(), 7);
        assert_eq!(AddressRow::COLUMNS.len(), 13);
        assert_eq!(ProductRow::COLUMNS.len(), 7);
        assert_eq!(OrderRow::COLUMNS.len(), 6);
    }

    #[test]
    fn customer_row_round_trips_with_addresses() {
        let mut customer = Customer::new("Ada", "Lovelace", "ada@example.com").unwrap();
        customer.add_address(Address::billing(lines())).unwrap();

        let row = CustomerRow::from(&customer);
        let address_rows: Vec<AddressRow> = customer
            .addresses()
            .iter()
            .map(|a| AddressRow::from_address(a).unwrap())
            .collect();
        assert_eq!(address_rows[0].address_type, "billing");
        assert_eq!(address_rows[0].customer_id, row.id);

        let addresses = address_rows
            .into_iter()
            .map(|r| r.into_address().unwrap())
            .collect();
        let restored = row.into_customer(addresses, vec![]).unwrap();
        assert_eq!(restored, customer);
    }

    #[test]
    fn detached_address_cannot_be_stored() {
        let err = AddressRow::from_address(&Address::shipping(lines())).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Domain(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let mut customer = Customer::new("Ada", "Lovelace", "ada@example.com").unwrap();
        customer.add_address(Address::new(AddressKind::Shipping, lines())).unwrap();
        let mut row = AddressRow::from_address(&customer.addresses()[0]).unwrap();
        row.address_type = "home".into();

        assert!(row.into_address().is_err());
    }

    #[test]
    fn product_stock_must_fit_column() {
        let product = Product::new("Crate", Decimal::new(500, 2), u32::MAX).unwrap();
        assert!(ProductRow::from_product(&product).is_err());

        let product = Product::new("Crate", Decimal::new(500, 2), 12).unwrap();
        let row = ProductRow::from_product(&product).unwrap();
        assert_eq!(row.stock_quantity, 12);
        assert_eq!(row.into_product(vec![]).unwrap(), product);
    }

    #[test]
    fn order_row_keeps_product_order() {
        let mut order = Order::new(CustomerId::new(), Decimal::new(2500, 2)).unwrap();
        let a = Product::new("A", Decimal::ONE, 1).unwrap();
        let b = Product::new("B", Decimal::ONE, 1).unwrap();
        order.add_product(&b).unwrap();
        order.add_product(&a).unwrap();

        let restored = OrderRow::from(&order)
            .into_order(order.product_ids().to_vec())
            .unwrap();
        assert_eq!(restored.product_ids(), &[*b.id(), *a.id()]);
        assert_eq!(restored, order);
    }
}
