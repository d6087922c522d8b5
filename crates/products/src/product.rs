use rust_decimal::Decimal;

use ecommerce_core::{
    AuditInfo, AuditedEntity, DomainError, DomainResult, Entity, OrderId, ProductId, ensure_money,
};

/// Entity: a product available for purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
    stock_quantity: u32,
    /// Orders that include this product (many-to-many, filled in by storage).
    order_ids: Vec<OrderId>,
    audit: AuditInfo,
}

/// Persisted state of a product, used to rehydrate it from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: u32,
    pub order_ids: Vec<OrderId>,
    pub audit: AuditInfo,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal, stock_quantity: u32) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let price = ensure_money(price, "price")?;

        Ok(Self {
            id: ProductId::new(),
            name,
            price,
            stock_quantity,
            order_ids: Vec::new(),
            audit: AuditInfo::new(),
        })
    }

    pub fn from_record(record: ProductRecord) -> DomainResult<Self> {
        if record.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let price = ensure_money(record.price, "price")?;

        Ok(Self {
            id: record.id,
            name: record.name,
            price,
            stock_quantity: record.stock_quantity,
            order_ids: record.order_ids,
            audit: record.audit,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Take `quantity` units out of stock.
    pub fn decrease_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.ensure_not_deleted()?;

        let remaining = self.stock_quantity.checked_sub(quantity).ok_or_else(|| {
            DomainError::invariant(format!(
                "insufficient stock: requested {quantity}, available {}",
                self.stock_quantity
            ))
        })?;

        self.stock_quantity = remaining;
        self.update_last_modified();
        Ok(())
    }

    /// Put `quantity` units back into stock.
    pub fn increase_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.ensure_not_deleted()?;

        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?;
        self.update_last_modified();
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AuditedEntity for Product {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}
