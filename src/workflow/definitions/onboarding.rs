//! User onboarding: welcome, a first task, and a reminder a day later.

use crate::notification::domain::NotificationKind;
use crate::task::domain::NewTask;
use crate::workflow::{
    activities::TaskActivities,
    domain::{OnboardingStage, UserOnboardingInput, UserOnboardingState, WorkflowError, WorkflowOutput},
    ports::WorkflowInstanceStore,
    runtime::WorkflowContext,
};
use chrono::TimeDelta;
use mockable::Clock;

/// Delay between onboarding and the profile reminder.
pub const REMINDER_DELAY: TimeDelta = TimeDelta::hours(24);

/// Title of the task every new user receives.
pub const ONBOARDING_TASK_TITLE: &str = "Complete Your Profile";

const ONBOARDING_TASK_DESCRIPTION: &str =
    "Please complete your profile information to get started with RelAI.";
const WELCOME_MESSAGE: &str = "Welcome to RelAI! Your account has been created successfully.";
const TASK_MESSAGE: &str = "Your onboarding task has been created. Please complete your profile.";
const REMINDER_MESSAGE: &str = "Reminder: Don't forget to complete your profile setup!";

/// Runs an onboarding instance from `state` until it finishes.
///
/// The reminder is sent whether or not the profile task exists.
///
/// # Errors
///
/// Returns [`WorkflowError`] when a checkpoint cannot be persisted.
pub async fn run<A, R, C>(
    ctx: &WorkflowContext<A, R, C>,
    input: &UserOnboardingInput,
    mut state: UserOnboardingState,
) -> Result<WorkflowOutput, WorkflowError>
where
    A: TaskActivities,
    R: WorkflowInstanceStore,
    C: Clock + Send + Sync,
{
    let user = &input.user_id;
    loop {
        match state.stage {
            OnboardingStage::Welcoming => {
                ctx.notify_best_effort(user, WELCOME_MESSAGE, NotificationKind::Welcome)
                    .await;
                state.stage = OnboardingStage::CreatingTask;
                ctx.checkpoint(state, 0).await?;
            }
            OnboardingStage::CreatingTask => {
                let draft = NewTask::new(ONBOARDING_TASK_TITLE)
                    .with_description(ONBOARDING_TASK_DESCRIPTION)
                    .with_assignee(user.clone())
                    .with_idempotency_key(format!("{}/onboarding-task", ctx.workflow_id()));
                match ctx.create_task(&draft).await {
                    Ok(task) => {
                        state.onboarding_task_id = Some(task.id());
                        ctx.notify_best_effort(user, TASK_MESSAGE, NotificationKind::OnboardingTask)
                            .await;
                    }
                    Err(failure) => {
                        tracing::warn!(
                            workflow_id = %ctx.workflow_id(),
                            user_id = %user,
                            error = %failure,
                            "onboarding task not created"
                        );
                    }
                }
                state.stage = OnboardingStage::AwaitingReminder;
                state.wake_at = Some(ctx.wake_at_after(REMINDER_DELAY)?);
                ctx.checkpoint(state, 0).await?;
            }
            OnboardingStage::AwaitingReminder => {
                if let Some(wake_at) = state.wake_at {
                    ctx.sleep_until(wake_at).await;
                }
                ctx.notify_best_effort(user, REMINDER_MESSAGE, NotificationKind::OnboardingReminder)
                    .await;
                state.stage = OnboardingStage::Finished;
                state.wake_at = None;
                ctx.checkpoint(state, 0).await?;
            }
            OnboardingStage::Finished => {
                return Ok(WorkflowOutput::succeeded()
                    .with_user_id(user.clone())
                    .with_onboarding_task_id(state.onboarding_task_id));
            }
        }
    }
}
