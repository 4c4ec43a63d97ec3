//! Order aggregate and related types.

mod aggregate;
mod value_objects;

pub use aggregate::Order;
pub use value_objects::{OrderItem, OrderNumber};

use thiserror::Error;

/// Errors raised by order aggregate invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Invalid quantity.
    #[error("Invalid quantity for {sku}: {quantity} (must be greater than 0)")]
    InvalidQuantity { sku: String, quantity: u32 },
}
