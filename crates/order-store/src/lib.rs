//! Persistence for customers, addresses, the catalog, orders and outbox messages.
//!
//! Reads go through the [`OrderStore`] query methods. Writes are staged in a
//! [`UnitOfWork`] and applied atomically by [`OrderStore::commit`].

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::DatabaseConfig;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::{Change, OrderStore, UnitOfWork};
