//! Delivery of committed outbox messages.

use chrono::Utc;
use domain::{OutboxMessage, OutboxStatus};
use order_store::{OrderStore, UnitOfWork};
use outbox::OutboxSender;

/// Hands committed outbox messages to the downstream sender and records the outcome.
///
/// Delivery is attempted once. Its outcome never fails the caller: the order
/// the message describes is already committed.
#[derive(Debug, Clone)]
pub struct OutboxPublisher<S: OrderStore, D: OutboxSender> {
    store: S,
    sender: D,
}

impl<S: OrderStore, D: OutboxSender> OutboxPublisher<S, D> {
    pub fn new(store: S, sender: D) -> Self {
        Self { store, sender }
    }

    /// Delivers `message` and stores its new status, which is also returned.
    #[tracing::instrument(skip_all, fields(message_id = %message.id, event_type = %message.event_type))]
    pub async fn publish(&self, message: &OutboxMessage) -> OutboxStatus {
        let mut work = UnitOfWork::new();
        let status = match self.sender.deliver(message).await {
            Ok(()) => {
                metrics::counter!("outbox_messages_delivered_total").increment(1);
                work.mark_outbox_delivered(message.id, Utc::now());
                OutboxStatus::Delivered
            }
            Err(e) => {
                metrics::counter!("outbox_delivery_failures_total").increment(1);
                tracing::error!(error = %e, "outbox delivery failed");
                work.mark_outbox_failed(message.id, e.to_string());
                OutboxStatus::Failed
            }
        };

        if let Err(e) = self.store.commit(work).await {
            tracing::error!(error = %e, status = %status, "failed to record outbox delivery status");
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_store::InMemoryOrderStore;
    use outbox::InMemoryOutboxSender;
    use uuid::Uuid;

    async fn stored_message(store: &InMemoryOrderStore) -> OutboxMessage {
        let message = OutboxMessage::new("Order", Uuid::new_v4(), "OrderCreated", serde_json::json!({}));
        let mut work = UnitOfWork::new();
        work.insert_outbox_message(message.clone());
        store.commit(work).await.unwrap();
        message
    }

    #[tokio::test]
    async fn test_successful_delivery_is_recorded() {
        let store = InMemoryOrderStore::new();
        let sender = InMemoryOutboxSender::new();
        let publisher = OutboxPublisher::new(store.clone(), sender.clone());
        let message = stored_message(&store).await;

        assert_eq!(publisher.publish(&message).await, OutboxStatus::Delivered);

        let stored = store.find_outbox_message(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Delivered);
        assert!(stored.delivered_at.is_some());
        assert_eq!(sender.delivered_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_recorded() {
        let store = InMemoryOrderStore::new();
        let sender = InMemoryOutboxSender::new();
        sender.set_fail_on_deliver(true);
        let publisher = OutboxPublisher::new(store.clone(), sender.clone());
        let message = stored_message(&store).await;

        assert_eq!(publisher.publish(&message).await, OutboxStatus::Failed);

        let stored = store.find_outbox_message(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.attempts, 1);
        assert!(stored.last_error.as_deref().unwrap().contains("downstream unavailable"));
    }

    #[tokio::test]
    async fn test_status_write_failure_is_swallowed() {
        let store = InMemoryOrderStore::new();
        let publisher = OutboxPublisher::new(store.clone(), InMemoryOutboxSender::new());
        let message = stored_message(&store).await;
        store.set_fail_on_commit(true);

        assert_eq!(publisher.publish(&message).await, OutboxStatus::Delivered);

        let stored = store.find_outbox_message(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Pending);
    }
}
