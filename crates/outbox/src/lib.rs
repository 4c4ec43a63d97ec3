//! Transactional outbox support.
//!
//! [`OutboxMessageCreator`] snapshots an aggregate into an [`OutboxMessage`]
//! that is persisted in the same unit of work as the change it describes.
//! An [`OutboxSender`] then forwards the persisted message downstream.

pub mod creator;
pub mod error;
pub mod sender;

pub use creator::{OutboxMessageCreator, OutboxPayload};
pub use domain::{OutboxMessage, OutboxStatus};
pub use error::{OutboxError, Result};
pub use sender::{ChannelOutboxSender, InMemoryOutboxSender, OutboxSender};
