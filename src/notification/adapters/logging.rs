//! Sink that emits each notification as a structured log line.

use crate::notification::{
    domain::{Notification, NotificationAck},
    ports::{NotificationResult, NotificationSink},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Fire-and-forget sink backed by `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingNotificationSink<C: Clock + Send + Sync> {
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> LoggingNotificationSink<C> {
    /// Creates a logging sink.
    #[must_use]
    pub const fn new(clock: Arc<C>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> NotificationSink for LoggingNotificationSink<C> {
    async fn notify(&self, notification: &Notification) -> NotificationResult<NotificationAck> {
        tracing::info!(
            user_id = %notification.user(),
            kind = notification.kind().as_str(),
            message = notification.message(),
            "notification sent"
        );
        Ok(NotificationAck {
            user_id: notification.user().clone(),
            kind: notification.kind(),
            sent_at: self.clock.utc(),
        })
    }
}
