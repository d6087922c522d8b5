use ecommerce_core::{
    AuditInfo, AuditedEntity, CustomerId, DomainError, DomainResult, Entity, OrderId,
};
use ecommerce_orders::Order;

use crate::address::{Address, AddressKind};
use crate::email::EmailAddress;

/// Entity: a customer using the e-commerce platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: EmailAddress,
    addresses: Vec<Address>,
    order_ids: Vec<OrderId>,
    audit: AuditInfo,
}

/// Persisted state of a customer, used to rehydrate it from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub addresses: Vec<Address>,
    pub order_ids: Vec<OrderId>,
    pub audit: AuditInfo,
}

fn ensure_name(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Customer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl AsRef<str>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        ensure_name("first name", &first_name)?;
        ensure_name("last name", &last_name)?;
        let email = EmailAddress::parse(email)?;

        Ok(Self {
            id: CustomerId::new(),
            first_name,
            last_name,
            email,
            addresses: Vec::new(),
            order_ids: Vec::new(),
            audit: AuditInfo::new(),
        })
    }

    pub fn from_record(record: CustomerRecord) -> DomainResult<Self> {
        ensure_name("first name", &record.first_name)?;
        ensure_name("last name", &record.last_name)?;
        let email = EmailAddress::parse(&record.email)?;

        if let Some(foreign) = record
            .addresses
            .iter()
            .find(|a| a.customer_id() != Some(record.id))
        {
            return Err(DomainError::invariant(format!(
                "address {} does not belong to customer {}",
                foreign.id(),
                record.id
            )));
        }

        Ok(Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email,
            addresses: record.addresses,
            order_ids: record.order_ids,
            audit: record.audit,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn billing_addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses_of(AddressKind::Billing)
    }

    pub fn shipping_addresses(&self) -> impl Iterator<Item = &Address> {
        self.addresses_of(AddressKind::Shipping)
    }

    fn addresses_of(&self, kind: AddressKind) -> impl Iterator<Item = &Address> {
        self.addresses.iter().filter(move |a| a.kind() == kind)
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    /// Attach an address to this customer.
    pub fn add_address(&mut self, mut address: Address) -> DomainResult<()> {
        self.ensure_not_deleted()?;
        address.ensure_not_deleted()?;

        match address.customer_id() {
            Some(owner) if owner != self.id => {
                return Err(DomainError::invariant(format!(
                    "address {} already belongs to customer {owner}",
                    address.id()
                )));
            }
            _ => {}
        }
        if self.addresses.iter().any(|a| a.id() == address.id()) {
            return Err(DomainError::conflict(format!(
                "address {} is already attached",
                address.id()
            )));
        }

        address.attach_to(self.id);
        self.addresses.push(address);
        self.update_last_modified();
        Ok(())
    }

    /// Record an order placed by this customer.
    pub fn add_order(&mut self, order: &Order) -> DomainResult<()> {
        self.ensure_not_deleted()?;

        if order.customer_id() != self.id {
            return Err(DomainError::invariant(format!(
                "order {} was placed by customer {}",
                order.id(),
                order.customer_id()
            )));
        }
        let order_id = *order.id();
        if self.order_ids.contains(&order_id) {
            return Err(DomainError::conflict(format!(
                "order {order_id} is already recorded"
            )));
        }

        self.order_ids.push(order_id);
        self.update_last_modified();
        Ok(())
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AuditedEntity for Customer {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}
