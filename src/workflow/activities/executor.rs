//! Activity implementations over the task and notification ports.

use super::{ActivityFailure, ActivityResult, CleanupReport, DeadlineCheck, TaskActivities};
use crate::notification::{
    domain::{Notification, NotificationAck},
    ports::NotificationSink,
};
use crate::task::{
    domain::{NewTask, Task, TaskId, TaskPatch, UserId},
    ports::{TaskStore, WorkflowBoard},
    services::{RelayTaskRequest, TaskRecordService, TaskServiceError},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Executes activities against the task record service and a notification
/// sink.
pub struct ActivityExecutor<S, B, N, C>
where
    S: TaskStore,
    B: WorkflowBoard,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    records: TaskRecordService<S, B, C>,
    notifications: Arc<N>,
    clock: Arc<C>,
}

impl<S, B, N, C> ActivityExecutor<S, B, N, C>
where
    S: TaskStore,
    B: WorkflowBoard,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates an executor.
    #[must_use]
    pub const fn new(
        records: TaskRecordService<S, B, C>,
        notifications: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            records,
            notifications,
            clock,
        }
    }
}

fn reported<T>(activity: &str, result: Result<T, TaskServiceError>) -> ActivityResult<T> {
    result.map_err(|err| {
        let failure = ActivityFailure::from(err);
        tracing::warn!(
            activity,
            retryable = failure.retryable,
            error = %failure,
            "activity failed"
        );
        failure
    })
}

#[async_trait]
impl<S, B, N, C> TaskActivities for ActivityExecutor<S, B, N, C>
where
    S: TaskStore,
    B: WorkflowBoard,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    async fn create_task(&self, draft: NewTask) -> ActivityResult<Task> {
        let task = reported("create_task", self.records.create(draft).await)?;
        tracing::info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    async fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> ActivityResult<Task> {
        let task = reported("update_task", self.records.update(task_id, patch).await)?;
        tracing::info!(%task_id, status = task.status().as_str(), "task updated");
        Ok(task)
    }

    async fn assign_task(&self, task_id: TaskId, user: UserId) -> ActivityResult<Task> {
        let task = reported(
            "assign_task",
            self.records.assign(task_id, user.clone()).await,
        )?;
        tracing::info!(%task_id, user_id = %user, "task assigned");
        Ok(task)
    }

    async fn relay_task(&self, request: RelayTaskRequest) -> ActivityResult<Task> {
        let task = reported("relay_task", self.records.relay(request).await)?;
        tracing::info!(
            task_id = %task.id(),
            from = ?task.relayed_from(),
            to = ?task.assigned_to(),
            "task relayed"
        );
        Ok(task)
    }

    async fn send_notification(
        &self,
        notification: Notification,
    ) -> ActivityResult<NotificationAck> {
        self.notifications
            .notify(&notification)
            .await
            .map_err(|err| {
                let failure = ActivityFailure::from(err);
                tracing::warn!(
                    user_id = %notification.user(),
                    kind = notification.kind().as_str(),
                    error = %failure,
                    "notification failed"
                );
                failure
            })
    }

    async fn check_task_deadline(&self, task_id: TaskId) -> ActivityResult<DeadlineCheck> {
        let task = reported("check_task_deadline", self.records.get(task_id).await)?
            .ok_or_else(|| ActivityFailure::permanent(format!("task not found: {task_id}")))?;
        let check = DeadlineCheck::evaluate(&task, self.clock.utc())?;
        tracing::debug!(
            %task_id,
            has_deadline = check.has_deadline,
            is_approaching = check.is_approaching,
            is_overdue = check.is_overdue,
            "deadline checked"
        );
        Ok(check)
    }

    async fn cleanup_completed_tasks(&self, days_old: u32) -> ActivityResult<CleanupReport> {
        let summary = reported(
            "cleanup_completed_tasks",
            self.records.purge_completed(days_old).await,
        )?;
        tracing::info!(
            days_old,
            cleaned_count = summary.removed,
            cutoff = %summary.cutoff,
            "completed tasks purged"
        );
        Ok(CleanupReport {
            cutoff: summary.cutoff,
            cleaned_count: summary.removed,
        })
    }
}
