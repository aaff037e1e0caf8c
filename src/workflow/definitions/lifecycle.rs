//! Task lifecycle: create, optionally assign, then monitor the deadline
//! hourly until the task is reported complete.

use crate::notification::domain::NotificationKind;
use crate::task::domain::{NewTask, TaskId, UserId};
use crate::workflow::{
    activities::TaskActivities,
    domain::{LifecycleStage, TaskLifecycleState, WorkflowError, WorkflowOutput},
    ports::WorkflowInstanceStore,
    runtime::WorkflowContext,
};
use chrono::TimeDelta;
use mockable::Clock;

/// Interval between deadline checks.
pub const MONITOR_INTERVAL: TimeDelta = TimeDelta::hours(1);

/// Runs a lifecycle instance from `state` until it finishes.
///
/// # Errors
///
/// Returns [`WorkflowError`] when a checkpoint cannot be persisted.
pub async fn run<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    draft: &NewTask,
    mut state: TaskLifecycleState,
) -> Result<WorkflowOutput, WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    loop {
        match (state.stage, state.task_id) {
            (LifecycleStage::Creating, _) | (_, None) => {
                let keyed = draft
                    .clone()
                    .with_idempotency_key(format!("{}/create", ctx.workflow_id()));
                match ctx.create_task(&keyed).await {
                    Ok(task) => {
                        tracing::info!(workflow_id = %ctx.workflow_id(), task_id = %task.id(), "task created");
                        state.task_id = Some(task.id());
                        state.stage = LifecycleStage::Assigning;
                    }
                    Err(failure) => {
                        tracing::error!(workflow_id = %ctx.workflow_id(), error = %failure, "task lifecycle failed");
                        return Ok(WorkflowOutput::failed(failure.message));
                    }
                }
                ctx.checkpoint(state.clone(), 0).await?;
            }
            (LifecycleStage::Assigning, Some(task_id)) => {
                if let Some(user) = draft.assigned_to() {
                    assign(ctx, draft, task_id, user, &mut state).await;
                }
                state.stage = LifecycleStage::Monitoring;
                ctx.checkpoint(state.clone(), 0).await?;
            }
            (LifecycleStage::Monitoring, Some(task_id)) => {
                monitor_once(ctx, task_id, &mut state).await?;
            }
            (LifecycleStage::Finished, Some(task_id)) => {
                return Ok(WorkflowOutput::succeeded().with_task_id(Some(task_id)));
            }
        }
    }
}

async fn assign<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    draft: &NewTask,
    task_id: TaskId,
    user: &UserId,
    state: &mut TaskLifecycleState,
) where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    match ctx.assign_task(task_id, user).await {
        Ok(_) => {
            tracing::info!(workflow_id = %ctx.workflow_id(), %task_id, user_id = %user, "task assigned");
            state.assigned_user = Some(user.clone());
            let message = format!("New task assigned: {}", draft.title());
            ctx.notify_best_effort(user, &message, NotificationKind::TaskAssignment)
                .await;
        }
        Err(failure) => {
            tracing::warn!(
                workflow_id = %ctx.workflow_id(),
                %task_id,
                user_id = %user,
                error = %failure,
                "assignment failed; monitoring unassigned"
            );
        }
    }
}

/// Absorbs pending signals into `state` and checkpoints when any arrived.
async fn absorb_signals<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    state: &mut TaskLifecycleState,
) -> Result<(), WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    let signals = ctx.pending_signals().await?;
    if signals.is_empty() {
        return Ok(());
    }
    for signal in &signals {
        state.apply(signal);
    }
    if state.is_completed {
        state.stage = LifecycleStage::Finished;
        state.wake_at = None;
    }
    ctx.checkpoint(state.clone(), signals.len()).await
}

/// One monitoring iteration: signal boundary, hourly timer, signal boundary,
/// deadline check.
async fn monitor_once<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    task_id: TaskId,
    state: &mut TaskLifecycleState,
) -> Result<(), WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    absorb_signals(ctx, state).await?;
    if state.is_completed {
        return Ok(());
    }

    if state.wake_at.is_none() {
        state.wake_at = Some(ctx.wake_at_after(MONITOR_INTERVAL)?);
        ctx.checkpoint(state.clone(), 0).await?;
    }
    if let Some(wake_at) = state.wake_at.take() {
        ctx.sleep_until(wake_at).await;
    }

    absorb_signals(ctx, state).await?;
    if state.is_completed {
        return Ok(());
    }

    check_deadline(ctx, task_id, state).await;
    state.deadline_checks = state.deadline_checks.saturating_add(1);
    ctx.checkpoint(state.clone(), 0).await
}

async fn check_deadline<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    task_id: TaskId,
    state: &TaskLifecycleState,
) where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    let check = match ctx.check_task_deadline(task_id).await {
        Ok(found) => found,
        Err(failure) => {
            tracing::error!(workflow_id = %ctx.workflow_id(), %task_id, error = %failure, "error monitoring task");
            return;
        }
    };
    let Some(user) = state.assigned_user.as_ref() else {
        return;
    };
    if check.is_overdue {
        let message = format!("Task overdue: {task_id}");
        ctx.notify_best_effort(user, &message, NotificationKind::DeadlineOverdue)
            .await;
    } else if check.is_approaching {
        let message = format!("Task deadline approaching: {task_id}");
        ctx.notify_best_effort(user, &message, NotificationKind::DeadlineWarning)
            .await;
    }
}
