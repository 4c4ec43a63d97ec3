//! Outbox error types.

use thiserror::Error;

/// Errors that can occur while creating or delivering outbox messages.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// The aggregate could not be serialized into a payload.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The downstream channel rejected the message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The downstream channel is no longer receiving.
    #[error("Downstream channel closed")]
    ChannelClosed,
}

/// Convenience type alias for outbox results.
pub type Result<T> = std::result::Result<T, OutboxError>;
