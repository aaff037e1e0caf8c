//! Periodic cleanup singleton: purge old completed tasks forever.

use crate::workflow::{
    activities::TaskActivities,
    domain::{PeriodicCleanupInput, PeriodicCleanupState, WorkflowError, WorkflowOutput},
    ports::WorkflowInstanceStore,
    runtime::WorkflowContext,
};
use chrono::TimeDelta;
use mockable::Clock;

/// Completed tasks older than this many days are purged.
pub const RETAIN_COMPLETED_DAYS: u32 = 30;

/// Runs the cleanup loop from `state`.
///
/// The loop has no exit under normal operation; a failed pass is logged and
/// the next one is scheduled.
///
/// # Errors
///
/// Returns [`WorkflowError`] when a checkpoint cannot be persisted.
pub async fn run<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    input: PeriodicCleanupInput,
    mut state: PeriodicCleanupState,
) -> Result<WorkflowOutput, WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    let interval = TimeDelta::days(i64::from(input.cleanup_interval_days()));
    loop {
        if state.wake_at.is_none() {
            state.wake_at = Some(ctx.wake_at_after(interval)?);
            ctx.checkpoint(state, 0).await?;
        }
        if let Some(wake_at) = state.wake_at.take() {
            ctx.sleep_until(wake_at).await;
        }

        match ctx.cleanup_completed_tasks(RETAIN_COMPLETED_DAYS).await {
            Ok(report) => {
                tracing::info!(
                    workflow_id = %ctx.workflow_id(),
                    cleaned_count = report.cleaned_count,
                    cutoff = %report.cutoff,
                    "cleanup completed"
                );
                state.last_cleaned = Some(report.cleaned_count);
            }
            Err(failure) => {
                tracing::error!(
                    workflow_id = %ctx.workflow_id(),
                    error = %failure,
                    "periodic cleanup failed"
                );
            }
        }
        state.passes = state.passes.saturating_add(1);
        ctx.checkpoint(state, 0).await?;
    }
}
