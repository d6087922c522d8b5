//! `ecommerce-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, and the auditing contract shared by every
//! persisted entity.

pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use audit::{AuditInfo, AuditedEntity};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AddressId, CustomerId, OrderId, ProductId};
pub use money::ensure_money;
pub use value_object::ValueObject;
