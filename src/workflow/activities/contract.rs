//! The activity contract shared by workflow definitions and executors.

use crate::notification::{
    domain::{Notification, NotificationAck},
    ports::NotificationError,
};
use crate::task::{
    domain::{NewTask, Task, TaskId, TaskPatch, UserId},
    ports::TaskStoreError,
    services::{RelayTaskRequest, TaskServiceError},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::DeadlineCheck;

/// Result type returned by every activity.
pub type ActivityResult<T> = Result<T, ActivityFailure>;

/// A failed activity attempt, reported instead of a raised fault.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ActivityFailure {
    /// Human-readable reason.
    pub message: String,
    /// Whether another attempt could succeed.
    pub retryable: bool,
}

impl ActivityFailure {
    /// A failure another attempt may fix.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure no retry can fix.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// An attempt that exceeded its start-to-close timeout.
    #[must_use]
    pub fn timed_out(activity: &str, timeout: Duration) -> Self {
        Self::transient(format!(
            "{activity} timed out after {}ms",
            timeout.as_millis()
        ))
    }
}

impl From<TaskServiceError> for ActivityFailure {
    fn from(err: TaskServiceError) -> Self {
        match &err {
            TaskServiceError::Store(TaskStoreError::Persistence(_))
            | TaskServiceError::Board(_) => Self::transient(err.to_string()),
            TaskServiceError::Domain(_)
            | TaskServiceError::NotFound(_)
            | TaskServiceError::Store(
                TaskStoreError::NotFound(_) | TaskStoreError::DuplicateTask(_),
            ) => Self::permanent(err.to_string()),
        }
    }
}

impl From<NotificationError> for ActivityFailure {
    fn from(err: NotificationError) -> Self {
        match &err {
            NotificationError::Rejected(_) => Self::permanent(err.to_string()),
            NotificationError::Unavailable(_) => Self::transient(err.to_string()),
        }
    }
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Completed tasks last touched before this instant were removed.
    pub cutoff: DateTime<Utc>,
    /// Number of tasks removed.
    pub cleaned_count: u64,
}

/// Units of work workflows can schedule.
///
/// Implementations must never panic on collaborator failure; every fault is
/// returned as an [`ActivityFailure`].
#[async_trait]
pub trait TaskActivities: Send + Sync {
    /// Creates a task record.
    async fn create_task(&self, draft: NewTask) -> ActivityResult<Task>;

    /// Applies a partial update to a task record.
    async fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> ActivityResult<Task>;

    /// Assigns a task and records it on the assignee's board.
    async fn assign_task(&self, task_id: TaskId, user: UserId) -> ActivityResult<Task>;

    /// Relays a task and records the handoff on both boards.
    async fn relay_task(&self, request: RelayTaskRequest) -> ActivityResult<Task>;

    /// Sends a notification.
    async fn send_notification(&self, notification: Notification)
    -> ActivityResult<NotificationAck>;

    /// Evaluates a task's estimated handoff against the current time.
    async fn check_task_deadline(&self, task_id: TaskId) -> ActivityResult<DeadlineCheck>;

    /// Purges completed tasks older than `days_old` days.
    async fn cleanup_completed_tasks(&self, days_old: u32) -> ActivityResult<CleanupReport>;
}
