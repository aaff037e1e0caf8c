//! Service layer for task record creation, editing, assignment and relay.

use crate::task::{
    domain::{
        ActiveWork, HandoffRecord, IncomingTask, NewTask, Task, TaskDomainError, TaskId,
        TaskPatch, UserId,
    },
    ports::{TaskStore, TaskStoreError, WorkflowBoard, WorkflowBoardError},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for relaying a task between users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTaskRequest {
    task_id: TaskId,
    from_user: UserId,
    to_user: UserId,
    message: Option<String>,
}

impl RelayTaskRequest {
    /// Creates a relay request without a note.
    #[must_use]
    pub const fn new(task_id: TaskId, from_user: UserId, to_user: UserId) -> Self {
        Self {
            task_id,
            from_user,
            to_user,
            message: None,
        }
    }

    /// Attaches a note for the receiving user.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Tasks completed before this instant were eligible.
    pub cutoff: DateTime<Utc>,
    /// Number of tasks removed.
    pub removed: u64,
}

/// Service-level errors for task record operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Board operation failed.
    #[error(transparent)]
    Board(#[from] WorkflowBoardError),
    /// No task exists with the given identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Result type for task record service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task record service.
#[derive(Clone)]
pub struct TaskRecordService<S, B, C>
where
    S: TaskStore,
    B: WorkflowBoard,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    board: Arc<B>,
    clock: Arc<C>,
}

impl<S, B, C> TaskRecordService<S, B, C>
where
    S: TaskStore,
    B: WorkflowBoard,
    C: Clock + Send + Sync,
{
    /// Creates a new task record service.
    #[must_use]
    pub const fn new(store: Arc<S>, board: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            board,
            clock,
        }
    }

    /// Creates a task.
    ///
    /// Reusing an idempotency key returns the task created the first time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when validation fails or the store
    /// rejects the write.
    pub async fn create(&self, draft: NewTask) -> TaskServiceResult<Task> {
        let task = Task::create(draft, &*self.clock)?;
        Ok(self.store.store(&task).await?)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the lookup fails.
    pub async fn get(&self, task_id: TaskId) -> TaskServiceResult<Option<Task>> {
        Ok(self.store.find_by_id(task_id).await?)
    }

    /// Applies a partial update to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown tasks.
    pub async fn update(&self, task_id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        task.apply_patch(patch, &*self.clock)?;
        self.store.update(&task).await?;
        Ok(task)
    }

    /// Assigns a task and records it as the assignee's active work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown tasks, or a store
    /// or board error. A board failure leaves the assignment in place.
    pub async fn assign(&self, task_id: TaskId, user: UserId) -> TaskServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        task.assign(user.clone(), &*self.clock);
        self.store.update(&task).await?;

        let work = ActiveWork {
            task_id,
            assigned_at: task.updated_at(),
        };
        self.board.record_active_work(&user, work).await?;
        Ok(task)
    }

    /// Relays a task and records the handoff on both users' boards.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown tasks,
    /// [`TaskDomainError::RelayToSelf`] when both users match, or a store or
    /// board error.
    pub async fn relay(&self, request: RelayTaskRequest) -> TaskServiceResult<Task> {
        let RelayTaskRequest {
            task_id,
            from_user,
            to_user,
            message,
        } = request;

        let mut task = self.load(task_id).await?;
        task.relay(from_user.clone(), to_user.clone(), &*self.clock)?;
        self.store.update(&task).await?;

        let relayed_at = task.relayed_at().unwrap_or_else(|| self.clock.utc());
        self.board
            .record_handoff(
                &from_user,
                HandoffRecord {
                    task_id,
                    to_user: to_user.clone(),
                    message: message.clone(),
                    relayed_at,
                },
            )
            .await?;
        self.board
            .record_incoming(
                &to_user,
                IncomingTask {
                    task_id,
                    from_user,
                    message,
                    received_at: relayed_at,
                },
            )
            .await?;
        Ok(task)
    }

    /// Removes completed tasks last updated more than `days_old` days ago.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the purge fails.
    pub async fn purge_completed(&self, days_old: u32) -> TaskServiceResult<PurgeSummary> {
        let cutoff = self.clock.utc() - TimeDelta::days(i64::from(days_old));
        let removed = self.store.delete_completed_before(cutoff).await?;
        Ok(PurgeSummary { cutoff, removed })
    }

    async fn load(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        self.store
            .find_by_id(task_id)
            .await?
            .ok_or(TaskServiceError::NotFound(task_id))
    }
}
