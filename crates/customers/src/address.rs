use serde::{Deserialize, Serialize};

use ecommerce_core::{
    AddressId, AuditInfo, AuditedEntity, CustomerId, DomainError, DomainResult, Entity,
    ValueObject,
};

/// Which purpose an address serves.
///
/// Both kinds share one storage table, distinguished by the `address_type`
/// discriminator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl AddressKind {
    /// Discriminator value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            AddressKind::Billing => "billing",
            AddressKind::Shipping => "shipping",
        }
    }
}

impl core::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AddressKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billing" => Ok(AddressKind::Billing),
            "shipping" => Ok(AddressKind::Shipping),
            other => Err(DomainError::validation(format!(
                "unknown address type '{other}'"
            ))),
        }
    }
}

/// The postal components of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLines {
    building_no: String,
    building_name: String,
    street_line1: String,
    street_line2: Option<String>,
    neighbourhood: String,
    city: String,
    zip_code: String,
}

impl AddressLines {
    pub fn new(
        building_no: impl Into<String>,
        building_name: impl Into<String>,
        street_line1: impl Into<String>,
        street_line2: Option<String>,
        neighbourhood: impl Into<String>,
        city: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> DomainResult<Self> {
        let lines = Self {
            building_no: building_no.into(),
            building_name: building_name.into(),
            street_line1: street_line1.into(),
            street_line2: street_line2.filter(|s| !s.trim().is_empty()),
            neighbourhood: neighbourhood.into(),
            city: city.into(),
            zip_code: zip_code.into(),
        };

        for (field, value) in [
            ("street line 1", &lines.street_line1),
            ("city", &lines.city),
            ("zip code", &lines.zip_code),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} cannot be empty")));
            }
        }

        Ok(lines)
    }

    pub fn building_no(&self) -> &str {
        &self.building_no
    }

    pub fn building_name(&self) -> &str {
        &self.building_name
    }

    pub fn street_line1(&self) -> &str {
        &self.street_line1
    }

    pub fn street_line2(&self) -> Option<&str> {
        self.street_line2.as_deref()
    }

    pub fn neighbourhood(&self) -> &str {
        &self.neighbourhood
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }
}

impl ValueObject for AddressLines {}

/// Entity: a physical address used for billing or shipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    id: AddressId,
    kind: AddressKind,
    lines: AddressLines,
    /// Owning customer; `None` until the address is added to a customer.
    customer_id: Option<CustomerId>,
    audit: AuditInfo,
}

/// Persisted state of an address, used to rehydrate it from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub id: AddressId,
    pub kind: AddressKind,
    pub lines: AddressLines,
    pub customer_id: CustomerId,
    pub audit: AuditInfo,
}

impl Address {
    pub fn new(kind: AddressKind, lines: AddressLines) -> Self {
        Self {
            id: AddressId::new(),
            kind,
            lines,
            customer_id: None,
            audit: AuditInfo::new(),
        }
    }

    pub fn billing(lines: AddressLines) -> Self {
        Self::new(AddressKind::Billing, lines)
    }

    pub fn shipping(lines: AddressLines) -> Self {
        Self::new(AddressKind::Shipping, lines)
    }

    pub fn from_record(record: AddressRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            lines: record.lines,
            customer_id: Some(record.customer_id),
            audit: record.audit,
        }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn is_billing(&self) -> bool {
        self.kind == AddressKind::Billing
    }

    pub fn is_shipping(&self) -> bool {
        self.kind == AddressKind::Shipping
    }

    pub fn lines(&self) -> &AddressLines {
        &self.lines
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub(crate) fn attach_to(&mut self, customer_id: CustomerId) {
        self.customer_id = Some(customer_id);
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AuditedEntity for Address {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_lines() -> AddressLines {
        AddressLines::new(
            "12",
            "Maple House",
            "High Street",
            None,
            "Old Town",
            "Springfield",
            "12345",
        )
        .unwrap()
    }

    #[test]
    fn kind_round_trips_through_discriminator() {
        for kind in [AddressKind::Billing, AddressKind::Shipping] {
            assert_eq!(kind.as_str().parse::<AddressKind>().unwrap(), kind);
        }
        assert!("home".parse::<AddressKind>().is_err());
    }

    #[test]
    fn blank_street_line2_is_normalised_to_none() {
        let lines = AddressLines::new(
            "1",
            "",
            "Main Road",
            Some("   ".to_string()),
            "Centre",
            "Leeds",
            "LS1",
        )
        .unwrap();
        assert_eq!(lines.street_line2(), None);
    }

    #[test]
    fn required_lines_are_validated() {
        let err = AddressLines::new("1", "", "Main Road", None, "Centre", " ", "LS1").unwrap_err();
        assert_eq!(err, DomainError::validation("city cannot be empty"));
    }

    #[test]
    fn new_address_is_detached() {
        let address = Address::shipping(sample_lines());
        assert!(address.is_shipping());
        assert!(!address.is_billing());
        assert_eq!(address.customer_id(), None);
        assert!(!address.is_deleted());
    }

    #[test]
    fn from_record_is_attached() {
        let customer_id = CustomerId::new();
        let address = Address::from_record(AddressRecord {
            id: AddressId::new(),
            kind: AddressKind::Billing,
            lines: sample_lines(),
            customer_id,
            audit: AuditInfo::new(),
        });
        assert_eq!(address.customer_id(), Some(customer_id));
        assert!(address.is_billing());
    }
}
