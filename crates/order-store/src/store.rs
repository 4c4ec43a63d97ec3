use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Address, AddressHash, Customer, Order, OrderNumber, OutboxMessage, OutboxMessageId, Variant,
};

use crate::Result;

/// A single staged write.
#[derive(Debug, Clone)]
pub enum Change {
    /// Inserts a new customer. Fails if the email is already taken.
    InsertCustomer(Customer),

    /// Inserts a new address. Fails if the hash is already taken.
    InsertAddress(Address),

    /// Inserts or updates the order row and replaces its items wholesale.
    SaveOrder(Order),

    /// Inserts a pending outbox message.
    InsertOutboxMessage(OutboxMessage),

    /// Records a successful delivery of an outbox message.
    MarkOutboxDelivered {
        id: OutboxMessageId,
        at: DateTime<Utc>,
    },

    /// Records a failed delivery attempt of an outbox message.
    MarkOutboxFailed { id: OutboxMessageId, error: String },
}

/// An ordered set of writes committed as one atomic unit.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    changes: Vec<Change>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_customer(&mut self, customer: Customer) -> &mut Self {
        self.changes.push(Change::InsertCustomer(customer));
        self
    }

    pub fn insert_address(&mut self, address: Address) -> &mut Self {
        self.changes.push(Change::InsertAddress(address));
        self
    }

    pub fn save_order(&mut self, order: Order) -> &mut Self {
        self.changes.push(Change::SaveOrder(order));
        self
    }

    pub fn insert_outbox_message(&mut self, message: OutboxMessage) -> &mut Self {
        self.changes.push(Change::InsertOutboxMessage(message));
        self
    }

    pub fn mark_outbox_delivered(&mut self, id: OutboxMessageId, at: DateTime<Utc>) -> &mut Self {
        self.changes.push(Change::MarkOutboxDelivered { id, at });
        self
    }

    pub fn mark_outbox_failed(&mut self, id: OutboxMessageId, error: impl Into<String>) -> &mut Self {
        self.changes.push(Change::MarkOutboxFailed {
            id,
            error: error.into(),
        });
        self
    }

    /// Returns the staged changes in order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Core trait for order store implementations.
///
/// Query methods never write. All writes go through [`OrderStore::commit`],
/// which applies every change of a unit of work or none of them.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Finds a customer by exact match on the stored (normalised) email.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Finds all stored addresses whose hash is in `hashes`, in one lookup.
    async fn find_addresses_by_hash(&self, hashes: &[AddressHash]) -> Result<Vec<Address>>;

    /// Finds all variants whose SKU is exactly one of `skus`, in one lookup.
    ///
    /// The owning product is loaded with each variant.
    async fn find_variants_by_sku(&self, skus: &[String]) -> Result<Vec<Variant>>;

    /// Loads a fully hydrated order (customer, addresses, items, variants, products).
    async fn find_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>>;

    /// Finds an outbox message by id.
    async fn find_outbox_message(&self, id: OutboxMessageId) -> Result<Option<OutboxMessage>>;

    /// Applies a unit of work atomically. An empty unit of work is a no-op.
    async fn commit(&self, work: UnitOfWork) -> Result<()>;
}
