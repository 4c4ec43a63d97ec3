//! Order-management workflows.
//!
//! This crate orchestrates the create, update and read paths for orders:
//!
//! - [`CustomerResolver`] and [`AddressResolver`] find or create the shared
//!   reference data a request points at.
//! - [`RequestValidator`] checks the resolved entities against the business rules.
//! - [`OrderAssembler`] turns requested SKUs and quantities into order lines.
//! - [`OrderCreator`] and [`OrderUpdater`] persist the order together with an
//!   outbox message in one unit of work, then hand the message to an
//!   [`OutboxPublisher`].
//! - [`OrderReader`] loads an order for presentation.
//!
//! [`OrderService`] is the boundary facade; it converts internal failures into
//! the opaque [`ServiceError`] taxonomy.

pub mod address;
pub mod assembler;
pub mod create;
pub mod customer;
pub mod error;
pub mod publish;
pub mod read;
pub mod request;
pub mod service;
#[cfg(test)]
mod test_support;
pub mod update;
pub mod validation;
pub mod view;

pub use address::{AddressResolver, ResolvedAddresses};
pub use assembler::OrderAssembler;
pub use create::OrderCreator;
pub use customer::CustomerResolver;
pub use error::{OrderingError, Result, ServiceError};
pub use publish::OutboxPublisher;
pub use read::OrderReader;
pub use request::{
    AddressRequest, CreateOrderRequest, CustomerRequest, OrderItemRequest, UpdateOrderRequest,
};
pub use service::OrderService;
pub use update::OrderUpdater;
pub use validation::{RequestValidator, ValidationErrors};
pub use view::{AddressView, CustomerView, OrderLineView, OrderView};

/// Event type of the outbox message written when an order is created.
pub const ORDER_CREATED: &str = "OrderCreated";

/// Event type of the outbox message written when an order is updated.
pub const ORDER_UPDATED: &str = "OrderUpdated";
