//! Starting, signalling and completing workflows through the orchestration
//! service.

use super::helpers::{Worker, worker};
use chrono::{TimeDelta, Utc};
use eyre::{ensure, eyre};
use relai::notification::domain::NotificationKind;
use relai::task::{
    domain::{NewTask, TaskStatus, UserId},
    ports::{TaskStore, WorkflowBoard},
};
use relai::workflow::{
    domain::{UserOnboardingInput, WorkflowStatus, WorkflowType},
    services::CLEANUP_SINGLETON_ID,
};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

fn user(name: &str) -> Result<UserId, eyre::Report> {
    Ok(UserId::new(name)?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relay_round_trip_updates_task_boards_and_inboxes(
    worker: Worker,
) -> Result<(), eyre::Report> {
    let task = worker
        .seed_task(NewTask::new("Design System Components").with_assignee(user("alice")?))
        .await?;

    let id = worker
        .service
        .start(
            WorkflowType::TaskRelay,
            json!({
                "task_id": task.id(),
                "from_user": "alice",
                "to_user": "bob",
                "message": "tokens are in figma"
            }),
            None,
        )
        .await?;
    let closed = worker
        .runtime()
        .wait_for_completion(&id, Some(Duration::from_secs(5)))
        .await?;

    ensure!(closed.status == WorkflowStatus::Completed, "relay closed as {}", closed.status);
    let relayed = worker
        .tasks
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre!("relayed task missing"))?;
    ensure!(relayed.assigned_to() == Some(&user("bob")?), "task not reassigned");
    let receiver = worker.board.board_for(&user("bob")?).await?;
    ensure!(receiver.incoming.len() == 1, "receiver board has no incoming entry");
    ensure!(
        worker.sent_kinds()?
            == vec![
                NotificationKind::TaskRelayReceived,
                NotificationKind::TaskRelaySent
            ],
        "unexpected notifications"
    );
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn onboarding_runs_to_completion_after_the_reminder(
    worker: Worker,
) -> Result<(), eyre::Report> {
    let input = UserOnboardingInput {
        name: Some("Sam".to_owned()),
        created_at: Some(Utc::now()),
        ..UserOnboardingInput::new(user("sam")?)
    };

    let id = worker.service.start_user_onboarding(input).await?;
    let closed = worker.runtime().wait_for_completion(&id, None).await?;

    ensure!(id.as_str() == "user-onboarding-sam", "unexpected id {id}");
    ensure!(closed.status == WorkflowStatus::Completed, "onboarding closed as {}", closed.status);
    let output = closed.result.ok_or_else(|| eyre!("missing output"))?;
    let task_id = output
        .onboarding_task_id
        .ok_or_else(|| eyre!("missing onboarding task"))?;
    let task = worker
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| eyre!("onboarding task not stored"))?;
    ensure!(task.title() == "Complete Your Profile", "unexpected title");
    ensure!(
        worker.sent_kinds()?
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
async fn lifecycle_monitors_until_completed(worker: Worker) -> Result<(), eyre::Report> {
    let handoff = (Utc::now() + TimeDelta::hours(6)).to_rfc3339();
    let draft = NewTask::new("Prepare launch")
        .with_assignee(user("uma")?)
        .with_estimated_handoff(handoff);

    let id = worker
        .service
        .start_task_lifecycle(draft, Some("task-lifecycle-launch"))
        .await?;
    tokio::time::sleep(Duration::from_secs(90 * 60)).await;
    worker.service.signal_task_completed(id.as_str()).await?;
    let closed = worker.runtime().wait_for_completion(&id, None).await?;

    ensure!(closed.status == WorkflowStatus::Completed, "lifecycle closed as {}", closed.status);
    let task_id = closed
        .result
        .and_then(|output| output.task_id)
        .ok_or_else(|| eyre!("missing task id"))?;
    let task = worker
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| eyre!("task missing"))?;
    ensure!(task.status() == TaskStatus::Active, "workflow must not edit status");
    ensure!(
        worker.sent_kinds()?
            == vec![
                NotificationKind::TaskAssignment,
                NotificationKind::DeadlineWarning
            ],
        "unexpected notifications: {:?}",
        worker.sent_kinds()?
    );
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cleanup_singleton_survives_repeated_starts(worker: Worker) -> Result<(), eyre::Report> {
    let first = worker.service.start_periodic_cleanup().await?;
    let second = worker.service.start_periodic_cleanup().await?;
    let status = worker.service.get_status(CLEANUP_SINGLETON_ID).await?;

    ensure!(first == second, "singleton identity changed");
    ensure!(status.status == WorkflowStatus::Running, "cleanup not running");
    ensure!(worker.instances.len()? == 1, "duplicate cleanup instances");
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn signals_to_non_lifecycle_workflows_are_refused(
    worker: Worker,
) -> Result<(), eyre::Report> {
    let id = worker.service.start_periodic_cleanup().await?;

    let result = worker.service.signal_task_completed(id.as_str()).await;

    ensure!(result.is_err(), "cleanup accepted a lifecycle signal");
    Ok(())
}
