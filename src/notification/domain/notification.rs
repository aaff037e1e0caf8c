//! Notification payload and delivery acknowledgement.

use super::NotificationKind;
use crate::task::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    user: UserId,
    message: String,
    kind: NotificationKind,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(user: UserId, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            user,
            message: message.into(),
            kind,
        }
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Returns the message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the notification category.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }
}

/// Acknowledgement that a sink accepted a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAck {
    /// Recipient of the notification.
    pub user_id: UserId,
    /// Category of the notification.
    pub kind: NotificationKind,
    /// When the sink accepted it.
    pub sent_at: DateTime<Utc>,
}
