//! Sink that keeps every accepted notification in memory.

use crate::notification::{
    domain::{Notification, NotificationAck, NotificationKind},
    ports::{NotificationError, NotificationResult, NotificationSink},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::{Arc, RwLock};

/// Thread-safe outbox recording deliveries in order.
#[derive(Debug, Clone)]
pub struct InMemoryNotificationOutbox<C: Clock + Send + Sync> {
    clock: Arc<C>,
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl<C: Clock + Send + Sync> InMemoryNotificationOutbox<C> {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            clock,
            sent: Arc::default(),
        }
    }

    /// Returns every notification accepted so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Unavailable`] when the lock is poisoned.
    pub fn sent(&self) -> NotificationResult<Vec<Notification>> {
        let sent = self.sent.read().map_err(poisoned)?;
        Ok(sent.clone())
    }

    /// Returns the accepted notifications of one kind.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Unavailable`] when the lock is poisoned.
    pub fn sent_of_kind(&self, kind: NotificationKind) -> NotificationResult<Vec<Notification>> {
        Ok(self
            .sent()?
            .into_iter()
            .filter(|notification| notification.kind() == kind)
            .collect())
    }
}

fn poisoned(err: impl ToString) -> NotificationError {
    NotificationError::unavailable(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl<C: Clock + Send + Sync> NotificationSink for InMemoryNotificationOutbox<C> {
    async fn notify(&self, notification: &Notification) -> NotificationResult<NotificationAck> {
        self.sent
            .write()
            .map_err(poisoned)?
            .push(notification.clone());
        Ok(NotificationAck {
            user_id: notification.user().clone(),
            kind: notification.kind(),
            sent_at: self.clock.utc(),
        })
    }
}
