//! Execution context handed to workflow definitions.
//!
//! The context is the only way a definition touches the outside world:
//! activity calls go through the policy table and the worker's concurrency
//! limit, timers are durable wake-up instants, and signals are read from the
//! persisted inbox.

use crate::notification::domain::{Notification, NotificationAck, NotificationKind};
use crate::task::{
    domain::{NewTask, Task, TaskId, TaskPatch, UserId},
    services::RelayTaskRequest,
};
use crate::workflow::{
    activities::{ActivityFailure, ActivityResult, CleanupReport, DeadlineCheck, TaskActivities},
    domain::{WorkflowError, WorkflowId, WorkflowSignal, WorkflowState},
    policy::{ActivityKind, ActivityPolicies},
    ports::WorkflowInstanceStore,
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Per-instance handle for scheduling activities, timers and checkpoints.
pub struct WorkflowContext<A, R, C> {
    workflow_id: WorkflowId,
    activities: Arc<A>,
    store: Arc<R>,
    clock: Arc<C>,
    policies: Arc<ActivityPolicies>,
    limiter: Arc<Semaphore>,
}

impl<A, R, C> WorkflowContext<A, R, C>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    pub(crate) const fn new(
        workflow_id: WorkflowId,
        activities: Arc<A>,
        store: Arc<R>,
        clock: Arc<C>,
        policies: Arc<ActivityPolicies>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            workflow_id,
            activities,
            store,
            clock,
            policies,
            limiter,
        }
    }

    /// Returns the identifier of the running instance.
    #[must_use]
    pub const fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    /// Returns the current time from the runtime clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Returns the wake-up instant `delay` from now.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TimerOverflow`] when the instant is not
    /// representable.
    pub fn wake_at_after(&self, delay: TimeDelta) -> Result<DateTime<Utc>, WorkflowError> {
        self.now()
            .checked_add_signed(delay)
            .ok_or(WorkflowError::TimerOverflow(delay))
    }

    /// Runs an activity under its policy: each attempt waits for a worker
    /// slot and is bounded by the start-to-close timeout; retryable failures
    /// are retried with backoff until the attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last [`ActivityFailure`] once no further attempt is
    /// allowed.
    pub async fn execute<T, F, Fut>(&self, kind: ActivityKind, call: F) -> ActivityResult<T>
    where
        F: Fn(Arc<A>) -> Fut,
        Fut: Future<Output = ActivityResult<T>>,
    {
        let options = self.policies.options_for(kind);
        let mut attempt: u32 = 1;
        loop {
            let outcome = self
                .attempt(
                    kind,
                    options.start_to_close_timeout,
                    call(Arc::clone(&self.activities)),
                )
                .await;
            match outcome {
                Ok(value) => return Ok(value),
                Err(failure) if failure.retryable && options.retry.should_retry(attempt) => {
                    let delay = options.retry.delay_after(attempt);
                    tracing::warn!(
                        workflow_id = %self.workflow_id,
                        activity = kind.as_str(),
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %failure,
                        "activity attempt failed"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(failure) => {
                    tracing::warn!(
                        workflow_id = %self.workflow_id,
                        activity = kind.as_str(),
                        attempt,
                        error = %failure,
                        "activity gave up"
                    );
                    return Err(failure);
                }
            }
        }
    }

    async fn attempt<T>(
        &self,
        kind: ActivityKind,
        timeout: Duration,
        call: impl Future<Output = ActivityResult<T>>,
    ) -> ActivityResult<T> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ActivityFailure::permanent("activity worker is shut down"))?;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(ActivityFailure::timed_out(kind.as_str(), timeout)))
    }

    /// Suspends until `wake_at`, measured against the runtime clock.
    ///
    /// An instant already in the past returns immediately, which is how a
    /// recovered timer resumes with its remaining duration.
    pub async fn sleep_until(&self, wake_at: DateTime<Utc>) {
        let remaining = (wake_at - self.now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(
            workflow_id = %self.workflow_id,
            %wake_at,
            remaining_secs = remaining.as_secs(),
            "timer started"
        );
        tokio::time::sleep(remaining).await;
    }

    /// Returns the signals waiting in the instance's inbox.
    ///
    /// Signals stay in the inbox until a checkpoint consumes them.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Persistence`] when the store fails.
    pub async fn pending_signals(&self) -> Result<Vec<WorkflowSignal>, WorkflowError> {
        Ok(self.store.pending_signals(&self.workflow_id).await?)
    }

    /// Persists `state` and consumes the first `consumed_signals` signals.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Persistence`] when the store fails.
    pub async fn checkpoint(
        &self,
        state: impl Into<WorkflowState>,
        consumed_signals: usize,
    ) -> Result<(), WorkflowError> {
        let snapshot = state.into();
        self.store
            .save_checkpoint(&self.workflow_id, &snapshot, consumed_signals)
            .await?;
        Ok(())
    }

    /// Runs [`TaskActivities::create_task`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn create_task(&self, draft: &NewTask) -> ActivityResult<Task> {
        self.execute(ActivityKind::CreateTask, |activities| {
            let payload = draft.clone();
            async move { activities.create_task(payload).await }
        })
        .await
    }

    /// Runs [`TaskActivities::update_task`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn update_task(&self, task_id: TaskId, patch: &TaskPatch) -> ActivityResult<Task> {
        self.execute(ActivityKind::UpdateTask, |activities| {
            let changes = patch.clone();
            async move { activities.update_task(task_id, changes).await }
        })
        .await
    }

    /// Runs [`TaskActivities::assign_task`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn assign_task(&self, task_id: TaskId, user: &UserId) -> ActivityResult<Task> {
        self.execute(ActivityKind::AssignTask, |activities| {
            let assignee = user.clone();
            async move { activities.assign_task(task_id, assignee).await }
        })
        .await
    }

    /// Runs [`TaskActivities::relay_task`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn relay_task(&self, request: &RelayTaskRequest) -> ActivityResult<Task> {
        self.execute(ActivityKind::RelayTask, |activities| {
            let relay = request.clone();
            async move { activities.relay_task(relay).await }
        })
        .await
    }

    /// Runs [`TaskActivities::send_notification`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn notify(
        &self,
        user: &UserId,
        message: &str,
        kind: NotificationKind,
    ) -> ActivityResult<NotificationAck> {
        let notification = Notification::new(user.clone(), message, kind);
        self.execute(ActivityKind::SendNotification, |activities| {
            let outgoing = notification.clone();
            async move { activities.send_notification(outgoing).await }
        })
        .await
    }

    /// Sends a notification whose failure must not affect the workflow.
    pub async fn notify_best_effort(&self, user: &UserId, message: &str, kind: NotificationKind) {
        if let Err(failure) = self.notify(user, message, kind).await {
            tracing::warn!(
                workflow_id = %self.workflow_id,
                user_id = %user,
                kind = kind.as_str(),
                error = %failure,
                "notification dropped"
            );
        }
    }

    /// Runs [`TaskActivities::check_task_deadline`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn check_task_deadline(&self, task_id: TaskId) -> ActivityResult<DeadlineCheck> {
        self.execute(ActivityKind::CheckTaskDeadline, |activities| async move {
            activities.check_task_deadline(task_id).await
        })
        .await
    }

    /// Runs [`TaskActivities::cleanup_completed_tasks`] under its policy.
    ///
    /// # Errors
    ///
    /// Returns the final [`ActivityFailure`].
    pub async fn cleanup_completed_tasks(&self, days_old: u32) -> ActivityResult<CleanupReport> {
        self.execute(ActivityKind::CleanupCompletedTasks, |activities| async move {
            activities.cleanup_completed_tasks(days_old).await
        })
        .await
    }
}
