//! Orders domain module.
//!
//! An order belongs to one customer and references the products it contains.

pub mod order;

pub use order::{Order, OrderRecord};
