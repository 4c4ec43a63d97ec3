//! Snapshotting aggregates into outbox messages.

use domain::{Order, OutboxMessage};
use serde::Serialize;
use uuid::Uuid;

use crate::Result;

/// An aggregate that can be published through the outbox.
pub trait OutboxPayload: Serialize {
    /// Returns the aggregate type name carried on the message.
    fn aggregate_type(&self) -> &'static str;

    /// Returns the identity of the aggregate instance.
    fn aggregate_id(&self) -> Uuid;
}

impl OutboxPayload for Order {
    fn aggregate_type(&self) -> &'static str {
        "Order"
    }

    fn aggregate_id(&self) -> Uuid {
        self.id().as_uuid()
    }
}

/// Builds pending outbox messages from aggregate snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutboxMessageCreator;

impl OutboxMessageCreator {
    pub fn new() -> Self {
        Self
    }

    /// Serializes the full current state of `aggregate` into a pending message.
    pub fn snapshot<T: OutboxPayload>(&self, aggregate: &T, event_type: &str) -> Result<OutboxMessage> {
        let payload = serde_json::to_value(aggregate)?;
        Ok(OutboxMessage::new(
            aggregate.aggregate_type(),
            aggregate.aggregate_id(),
            event_type,
            payload,
        ))
    }
}
