//! Customers domain module.
//!
//! A customer owns its billing/shipping addresses and keeps track of the orders it
//! placed. Addresses are stored with the customer; orders are separate entities
//! referenced by id.

pub mod address;
pub mod customer;
pub mod email;

pub use address::{Address, AddressKind, AddressLines, AddressRecord};
pub use customer::{Customer, CustomerRecord};
pub use email::EmailAddress;
