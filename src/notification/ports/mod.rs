//! Port contracts for notification delivery.

mod sink;

pub use sink::{NotificationError, NotificationResult, NotificationSink};
