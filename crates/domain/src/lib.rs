//! Domain layer for the order-management service.
//!
//! This crate holds the persistent entities and the order aggregate:
//! - `Customer`, deduplicated by normalised email
//! - `Address`, deduplicated by a content hash over its fields
//! - `Product` / `Variant`, the read-only catalog
//! - `Order` with its `OrderItem`s, the consistency boundary for writes
//! - `OutboxMessage`, the persisted change notification for an order
//!
//! Nothing here performs I/O.

pub mod address;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod outbox;

pub use address::{Address, AddressHash};
pub use catalog::{Product, Variant};
pub use common::{AddressId, CustomerId, OrderId, OutboxMessageId, ProductId, VariantId};
pub use customer::Customer;
pub use order::{Order, OrderError, OrderItem, OrderNumber};
pub use outbox::{OutboxMessage, OutboxStatus};
