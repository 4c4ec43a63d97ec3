//! Identifier types shared across the order-management crates.

mod ids;

pub use ids::{AddressId, CustomerId, OrderId, OutboxMessageId, ProductId, VariantId};
