use rust_decimal::Decimal;

use ecommerce_core::{
    AuditInfo, AuditedEntity, CustomerId, DomainError, DomainResult, Entity, OrderId, ProductId,
    ensure_money,
};
use ecommerce_products::Product;

/// Entity: a customer order consisting of one or more products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    total_amount: Decimal,
    /// Products in insertion order (many-to-many with `Product`).
    product_ids: Vec<ProductId>,
    audit: AuditInfo,
}

/// Persisted state of an order, used to rehydrate it from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub total_amount: Decimal,
    pub product_ids: Vec<ProductId>,
    pub audit: AuditInfo,
}

impl Order {
    /// Create an order placed by `customer_id`.
    pub fn new(customer_id: CustomerId, total_amount: Decimal) -> DomainResult<Self> {
        let total_amount = ensure_money(total_amount, "total amount")?;
        Ok(Self {
            id: OrderId::new(),
            customer_id,
            total_amount,
            product_ids: Vec::new(),
            audit: AuditInfo::new(),
        })
    }

    pub fn from_record(record: OrderRecord) -> DomainResult<Self> {
        let total_amount = ensure_money(record.total_amount, "total amount")?;
        Ok(Self {
            id: record.id,
            customer_id: record.customer_id,
            total_amount,
            product_ids: record.product_ids,
            audit: record.audit,
        })
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    /// Add a product to this order.
    ///
    /// Deleted products cannot be ordered and a product appears at most once.
    pub fn add_product(&mut self, product: &Product) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        if product.is_deleted() {
            return Err(DomainError::invariant(format!(
                "product {} is deleted",
                product.id()
            )));
        }

        let product_id = *product.id();
        if self.contains_product(product_id) {
            return Err(DomainError::conflict(format!(
                "product {product_id} is already part of the order"
            )));
        }

        self.product_ids.push(product_id);
        self.update_last_modified();
        Ok(())
    }

    /// Remove a product from this order.
    ///
    /// Returns `false` (and leaves the order untouched) if the product was not in it.
    pub fn remove_product(&mut self, product_id: ProductId) -> DomainResult<bool> {
        self.ensure_not_deleted()?;

        let Some(pos) = self.product_ids.iter().position(|p| *p == product_id) else {
            return Ok(false);
        };

        self.product_ids.remove(pos);
        self.update_last_modified();
        Ok(true)
    }

    pub fn update_total_amount(&mut self, new_amount: Decimal) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        self.total_amount = ensure_money(new_amount, "total amount")?;
        self.update_last_modified();
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AuditedEntity for Order {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn test_order() -> Order {
        Order::new(CustomerId::new(), amount(0)).unwrap()
    }

    fn test_product(name: &str) -> Product {
        Product::new(name, amount(1250), 10).unwrap()
    }

    #[test]
    fn new_order_references_customer() {
        let customer_id = CustomerId::new();
        let order = Order::new(customer_id, amount(4200)).unwrap();
        assert_eq!(order.customer_id(), customer_id);
        assert_eq!(order.total_amount(), amount(4200));
        assert!(order.product_ids().is_empty());
        assert!(order.last_modified_at().is_none());
    }

    #[test]
    fn new_order_rejects_negative_total() {
        let err = Order::new(CustomerId::new(), amount(-100)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn add_product_appends_in_order_and_stamps() {
        let mut order = test_order();
        let a = test_product("Cable");
        let b = test_product("Charger");

        order.add_product(&a).unwrap();
        order.add_product(&b).unwrap();

        assert_eq!(order.product_ids(), &[*a.id(), *b.id()]);
        assert!(order.last_modified_at().is_some());
    }

    #[test]
    fn add_product_rejects_duplicates() {
        let mut order = test_order();
        let a = test_product("Cable");
        order.add_product(&a).unwrap();

        let err = order.add_product(&a).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(order.product_ids().len(), 1);
    }

    #[test]
    fn add_product_rejects_deleted_product() {
        let mut order = test_order();
        let mut a = test_product("Cable");
        a.mark_as_deleted();

        let err = order.add_product(&a).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(order.product_ids().is_empty());
    }

    #[test]
    fn remove_product_reports_whether_it_was_present() {
        let mut order = test_order();
        let a = test_product("Cable");
        order.add_product(&a).unwrap();

        assert!(order.remove_product(*a.id()).unwrap());
        assert!(!order.contains_product(*a.id()));
        assert!(!order.remove_product(*a.id()).unwrap());
    }

    #[test]
    fn remove_missing_product_does_not_stamp() {
        let mut order = test_order();
        assert!(!order.remove_product(ProductId::new()).unwrap());
        assert!(order.last_modified_at().is_none());
    }

    #[test]
    fn update_total_amount_sets_and_stamps() {
        let mut order = test_order();
        order.update_total_amount(amount(9999)).unwrap();
        assert_eq!(order.total_amount(), amount(9999));
        assert!(order.last_modified_at().is_some());
    }

    #[test]
    fn update_total_amount_validates() {
        let mut order = test_order();
        assert!(order.update_total_amount(Decimal::new(1, 3)).is_err());
        assert_eq!(order.total_amount(), amount(0));
    }

    #[test]
    fn deleted_order_is_read_only() {
        let mut order = test_order();
        let a = test_product("Cable");
        order.mark_as_deleted();

        assert!(order.add_product(&a).is_err());
        assert!(order.remove_product(*a.id()).is_err());
        assert!(order.update_total_amount(amount(1)).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: after any add/remove sequence the order holds each product at most once,
            /// in first-added order.
            #[test]
            fn products_stay_unique_and_ordered(ops in proptest::collection::vec((0usize..5, any::<bool>()), 0..40)) {
                let catalog: Vec<Product> = (0..5).map(|i| test_product(&format!("P{i}"))).collect();
                let mut order = test_order();
                let mut model: Vec<ProductId> = Vec::new();

                for (idx, add) in ops {
                    let product = &catalog[idx];
                    let id = *product.id();
                    if add {
                        let res = order.add_product(product);
                        if model.contains(&id) {
                            prop_assert!(res.is_err());
                        } else {
                            prop_assert!(res.is_ok());
                            model.push(id);
                        }
                    } else {
                        let removed = order.remove_product(id).unwrap();
                        prop_assert_eq!(removed, model.contains(&id));
                        model.retain(|p| *p != id);
                    }
                    prop_assert_eq!(order.product_ids(), model.as_slice());
                }
            }
        }
    }
}
