//! Downstream delivery of outbox messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::OutboxMessage;
use tokio::sync::{Mutex, mpsc};

use crate::{OutboxError, Result};

/// Forwards a persisted outbox message to a downstream channel.
///
/// Delivery is a single synchronous attempt; there is no acknowledgment
/// contract beyond the returned result.
#[async_trait]
pub trait OutboxSender: Send + Sync {
    async fn deliver(&self, message: &OutboxMessage) -> Result<()>;
}

#[async_trait]
impl<T: OutboxSender + ?Sized> OutboxSender for Arc<T> {
    async fn deliver(&self, message: &OutboxMessage) -> Result<()> {
        (**self).deliver(message).await
    }
}

/// In-memory sender for testing; records every delivered message.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutboxSender {
    delivered: Arc<Mutex<Vec<OutboxMessage>>>,
    fail_on_deliver: Arc<AtomicBool>,
}

impl InMemoryOutboxSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sender to reject deliveries.
    pub fn set_fail_on_deliver(&self, fail: bool) {
        self.fail_on_deliver.store(fail, Ordering::SeqCst);
    }

    /// Returns the messages delivered so far, in delivery order.
    pub async fn delivered(&self) -> Vec<OutboxMessage> {
        self.delivered.lock().await.clone()
    }

    /// Returns the number of delivered messages.
    pub async fn delivered_count(&self) -> usize {
        self.delivered.lock().await.len()
    }
}

#[async_trait]
impl OutboxSender for InMemoryOutboxSender {
    async fn deliver(&self, message: &OutboxMessage) -> Result<()> {
        if self.fail_on_deliver.load(Ordering::SeqCst) {
            return Err(OutboxError::Delivery("downstream unavailable".to_string()));
        }
        self.delivered.lock().await.push(message.clone());
        Ok(())
    }
}

/// Sender backed by a bounded tokio channel.
///
/// The receiving half is handed to whatever relays messages to the broker.
#[derive(Debug, Clone)]
pub struct ChannelOutboxSender {
    tx: mpsc::Sender<OutboxMessage>,
}

impl ChannelOutboxSender {
    /// Creates a sender and the receiver for its downstream side.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboxMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutboxSender for ChannelOutboxSender {
    async fn deliver(&self, message: &OutboxMessage) -> Result<()> {
        self.tx
            .send(message.clone())
            .await
            .map_err(|_| OutboxError::ChannelClosed)?;
        tracing::debug!(message_id = %message.id, event_type = %message.event_type, "outbox message forwarded");
        Ok(())
    }
}
