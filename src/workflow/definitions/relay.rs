//! Task relay: move a task to another user, then tell both of them.

use crate::notification::domain::NotificationKind;
use crate::task::services::RelayTaskRequest;
use crate::workflow::{
    activities::TaskActivities,
    domain::{RelayStage, TaskRelayInput, TaskRelayState, WorkflowError, WorkflowOutput},
    ports::WorkflowInstanceStore,
    runtime::WorkflowContext,
};
use mockable::Clock;

/// Runs a relay instance from `state` until it finishes.
///
/// A failed relay ends the run with `success = false` before any
/// notification is sent.
///
/// # Errors
///
/// Returns [`WorkflowError`] when a checkpoint cannot be persisted.
pub async fn run<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    input: &TaskRelayInput,
    mut state: TaskRelayState,
) -> Result<WorkflowOutput, WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    let TaskRelayInput {
        task_id,
        from_user,
        to_user,
        message,
    } = input;

    loop {
        match state.stage {
            RelayStage::Relaying => {
                let mut request =
                    RelayTaskRequest::new(*task_id, from_user.clone(), to_user.clone());
                if let Some(note) = message {
                    request = request.with_message(note.clone());
                }
                if let Err(failure) = ctx.relay_task(&request).await {
                    tracing::error!(
                        workflow_id = %ctx.workflow_id(),
                        %task_id,
                        error = %failure,
                        "task relay failed"
                    );
                    return Ok(WorkflowOutput::failed(failure.message).with_task_id(Some(*task_id)));
                }
                state.stage = RelayStage::Notifying;
                ctx.checkpoint(state, 0).await?;
            }
            RelayStage::Notifying => {
                let received = message.as_ref().map_or_else(
                    || format!("Task relayed to you from {from_user}: {task_id}"),
                    |note| format!("Task relayed to you from {from_user}: {task_id} ({note})"),
                );
                ctx.notify_best_effort(to_user, &received, NotificationKind::TaskRelayReceived)
                    .await;
                let sent = format!("Task successfully relayed to {to_user}: {task_id}");
                ctx.notify_best_effort(from_user, &sent, NotificationKind::TaskRelaySent)
                    .await;
                state.stage = RelayStage::Finished;
                ctx.checkpoint(state, 0).await?;
            }
            RelayStage::Finished => {
                return Ok(WorkflowOutput::succeeded().with_task_id(Some(*task_id)));
            }
        }
    }
}
