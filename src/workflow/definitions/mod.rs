//! The workflow definitions and their dispatcher.
//!
//! Each definition is a stage machine over its checkpointed state, so the
//! same code path serves a fresh start and a recovered instance.

pub mod cleanup;
pub mod lifecycle;
pub mod onboarding;
pub mod relay;

use crate::workflow::{
    activities::TaskActivities,
    domain::{WorkflowError, WorkflowInput, WorkflowOutput, WorkflowState},
    ports::WorkflowInstanceStore,
    runtime::WorkflowContext,
};
use mockable::Clock;

/// Runs the definition matching `input` from `state`.
///
/// # Errors
///
/// Returns [`WorkflowError::StateMismatch`] when `state` belongs to another
/// workflow type, or any error raised by the definition.
pub async fn run<A, R, C>(
    ctx: WorkflowContext<A, R, C>,
    input: WorkflowInput,
    state: WorkflowState,
) -> Result<WorkflowOutput, WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    match (input, state) {
        (WorkflowInput::TaskLifecycle(draft), WorkflowState::TaskLifecycle(current)) => {
            lifecycle::run(&ctx, &draft, current).await
        }
        (WorkflowInput::TaskRelay(relay_input), WorkflowState::TaskRelay(current)) => {
            relay::run(&ctx, &relay_input, current).await
        }
        (WorkflowInput::UserOnboarding(user_input), WorkflowState::UserOnboarding(current)) => {
            onboarding::run(&ctx, &user_input, current).await
        }
        (WorkflowInput::PeriodicCleanup(cadence), WorkflowState::PeriodicCleanup(current)) => {
            cleanup::run(&ctx, cadence, current).await
        }
        (mismatched, _) => Err(WorkflowError::StateMismatch(mismatched.workflow_type())),
    }
}
