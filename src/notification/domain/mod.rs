//! Notification values.

mod kind;
mod notification;

pub use kind::{NotificationKind, ParseNotificationKindError};
pub use notification::{Notification, NotificationAck};
