//! Notification sink port.

use crate::notification::domain::{Notification, NotificationAck};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification delivery.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Delivery channel for user notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Hands a notification to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the channel refuses the message.
    async fn notify(&self, notification: &Notification) -> NotificationResult<NotificationAck>;
}

/// Errors returned by notification sinks.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The channel rejected the message.
    #[error("notification rejected: {0}")]
    Rejected(String),

    /// The channel could not be reached.
    #[error("notification channel unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationError {
    /// Wraps a channel failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
