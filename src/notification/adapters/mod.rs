//! Notification sink implementations.

mod logging;
mod outbox;

pub use logging::LoggingNotificationSink;
pub use outbox::InMemoryNotificationOutbox;
