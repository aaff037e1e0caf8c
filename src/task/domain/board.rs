//! Per-user workflow board: what a user is working on, what is coming in,
//! and what they have handed off.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The task a user is currently working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWork {
    /// Task being worked on.
    pub task_id: TaskId,
    /// When the task was assigned.
    pub assigned_at: DateTime<Utc>,
}

/// A task relayed to a user by someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTask {
    /// Relayed task.
    pub task_id: TaskId,
    /// User who relayed the task.
    pub from_user: UserId,
    /// Optional note left by the sender.
    pub message: Option<String>,
    /// When the relay was received.
    pub received_at: DateTime<Utc>,
}

/// A task a user relayed to someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRecord {
    /// Relayed task.
    pub task_id: TaskId,
    /// User who received the task.
    pub to_user: UserId,
    /// Optional note left for the receiver.
    pub message: Option<String>,
    /// When the relay happened.
    pub relayed_at: DateTime<Utc>,
}

/// Aggregated board for a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBoard {
    /// Current work, if any.
    pub active_work: Option<ActiveWork>,
    /// Tasks relayed to the user, most recent first.
    pub incoming: Vec<IncomingTask>,
    /// Tasks the user relayed away, most recent first.
    pub handoffs: Vec<HandoffRecord>,
}
