//! Transactional outbox message.

use chrono::{DateTime, Utc};
use common::OutboxMessageId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status of an outbox message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Persisted, not yet handed to the downstream channel.
    #[default]
    Pending,

    /// Accepted by the downstream channel.
    Delivered,

    /// The last delivery attempt failed.
    Failed,
}

impl OutboxStatus {
    /// Returns the name used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "Pending",
            OutboxStatus::Delivered => "Delivered",
            OutboxStatus::Failed => "Failed",
        }
    }

    /// Parses a stored status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(OutboxStatus::Pending),
            "Delivered" => Some(OutboxStatus::Delivered),
            "Failed" => Some(OutboxStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of an aggregate, persisted alongside the change it describes
/// and then forwarded downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: OutboxMessageId,

    /// Kind of aggregate the payload describes (e.g. "Order").
    pub aggregate_type: String,

    pub aggregate_id: Uuid,

    /// What happened (e.g. "OrderCreated").
    pub event_type: String,

    /// Serialized snapshot of the aggregate.
    pub payload: serde_json::Value,

    pub status: OutboxStatus,

    /// Number of delivery attempts made so far.
    pub attempts: i32,

    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,

    pub delivered_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    /// Creates a pending message.
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: Uuid,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: OutboxMessageId::new(),
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            event_type: event_type.into(),
            payload,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }

    /// Records a successful delivery.
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) {
        self.status = OutboxStatus::Delivered;
        self.attempts += 1;
        self.last_error = None;
        self.delivered_at = Some(at);
    }

    /// Records a failed delivery attempt.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Failed;
        self.attempts += 1;
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutboxMessage {
        OutboxMessage::new(
            "Order",
            Uuid::new_v4(),
            "OrderCreated",
            serde_json::json!({"order_number": "ORD-1"}),
        )
    }

    #[test]
    fn new_message_is_pending() {
        let message = message();
        assert_eq!(message.status, OutboxStatus::Pending);
        assert_eq!(message.attempts, 0);
        assert!(message.delivered_at.is_none());
    }

    #[test]
    fn mark_delivered_clears_error() {
        let mut message = message();
        message.mark_failed("broker down");
        message.mark_delivered(Utc::now());

        assert_eq!(message.status, OutboxStatus::Delivered);
        assert_eq!(message.attempts, 2);
        assert!(message.last_error.is_none());
        assert!(message.delivered_at.is_some());
    }

    #[test]
    fn mark_failed_records_reason() {
        let mut message = message();
        message.mark_failed("broker down");

        assert_eq!(message.status, OutboxStatus::Failed);
        assert_eq!(message.last_error.as_deref(), Some("broker down"));
        assert!(message.delivered_at.is_none());
    }

    #[test]
    fn status_names_round_trip() {
        for status in [
            OutboxStatus::Pending,
            OutboxStatus::Delivered,
            OutboxStatus::Failed,
        ] {
            assert_eq!(OutboxStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OutboxStatus::parse("Unknown"), None);
    }
}
