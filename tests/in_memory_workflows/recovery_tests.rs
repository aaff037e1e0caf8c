//! Resuming open workflow instances on a restarted worker.

use super::helpers::{Worker, worker};
use eyre::{ensure, eyre};
use relai::notification::domain::NotificationKind;
use relai::task::domain::{NewTask, UserId};
use relai::workflow::{
    domain::{UserOnboardingInput, WorkflowStatus},
    runtime::RuntimeError,
    services::OrchestrationError,
};
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[tokio::test(start_paused = true)]
async fn onboarding_resumes_without_repeating_finished_steps(
    worker: Worker,
) -> Result<(), eyre::Report> {
    let id = worker
        .service
        .start_user_onboarding(UserOnboardingInput::new(UserId::new("tess")?))
        .await?;
    tokio::time::sleep(Duration::from_secs(3600)).await;
    worker.runtime().shutdown().await;

    let restarted = worker.restarted();
    let resumed = restarted.runtime().recover().await?;
    let closed = restarted.runtime().wait_for_completion(&id, None).await?;

    ensure!(resumed == 1, "expected one resumed instance, got {resumed}");
    ensure!(closed.status == WorkflowStatus::Completed, "onboarding closed as {}", closed.status);
    ensure!(worker.tasks.len()? == 1, "onboarding task created twice");
    ensure!(
        restarted.sent_kinds()?
            == vec![
                NotificationKind::Welcome,
                NotificationKind::OnboardingTask,
                NotificationKind::OnboardingReminder
            ],
        "unexpected notifications"
    );
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn signal_queued_while_down_is_applied_after_recovery(
    worker: Worker,
) -> Result<(), eyre::Report> {
    let id = worker
        .service
        .start_task_lifecycle(NewTask::new("Survive restarts"), Some("task-lifecycle-restart"))
        .await?;
    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    worker.runtime().shutdown().await;

    let restarted = worker.restarted();
    restarted.service.signal_task_completed(id.as_str()).await?;
    restarted.runtime().recover().await?;
    let closed = restarted
        .runtime()
        .wait_for_completion(&id, Some(Duration::from_secs(2 * 3600)))
        .await?;

    ensure!(closed.status == WorkflowStatus::Completed, "lifecycle closed as {}", closed.status);
    ensure!(worker.tasks.len()? == 1, "task created twice");
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stopped_worker_refuses_new_starts(worker: Worker) -> Result<(), eyre::Report> {
    worker.runtime().shutdown().await;

    let result = worker
        .service
        .start_user_onboarding(UserOnboardingInput::new(UserId::new("uri")?))
        .await;

    let err = result.err().ok_or_else(|| eyre!("start succeeded after shutdown"))?;
    ensure!(
        matches!(
            err,
            OrchestrationError::Runtime(RuntimeError::ShutDown)
        ),
        "unexpected error {err}"
    );
    Ok(())
}
