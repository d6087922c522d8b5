//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. An e-mail address or the lines of a postal address are value
//! objects, while a `Customer` (same id, changing data) is an entity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. Constructors are expected to validate, so holding a value
/// object means holding a valid value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
