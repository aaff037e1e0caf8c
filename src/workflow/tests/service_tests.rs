//! Orchestration service tests.

use super::support::{World, user};
use crate::notification::domain::NotificationKind;
use crate::task::domain::NewTask;
use crate::workflow::{
    domain::{UserOnboardingInput, WorkflowError, WorkflowStatus, WorkflowType},
    runtime::RuntimeError,
    services::{CLEANUP_SINGLETON_ID, OrchestrationError},
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn world() -> World {
    World::new()
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cleanup_singleton_is_started_once(world: World) {
    let service = world.service();

    let first = service.start_periodic_cleanup().await.expect("first start");
    let second = service
        .start(WorkflowType::PeriodicCleanup, json!({ "cleanup_interval_days": 3 }), None)
        .await
        .expect("second start is accepted");

    assert_eq!(first.as_str(), CLEANUP_SINGLETON_ID);
    assert_eq!(second, first);
    assert_eq!(world.instances.len().expect("store readable"), 1);
    assert_eq!(world.runtime.executing().await, 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn derived_identifiers_follow_workflow_prefixes(world: World) {
    let service = world.service();
    let task = world
        .seed_task(NewTask::new("Relay me").with_assignee(user("alice")))
        .await;

    let lifecycle = service
        .start_task_lifecycle(NewTask::new("Derived"), None)
        .await
        .expect("lifecycle starts");
    let relay = service
        .start_task_relay(task.id(), user("alice"), user("bob"), None)
        .await
        .expect("relay starts");
    let onboarding = service
        .start_user_onboarding(UserOnboardingInput::new(user("nia")))
        .await
        .expect("onboarding starts");

    assert!(
        lifecycle
            .as_str()
            .starts_with("task-lifecycle-2026-03-02T09:00:00.000000Z-")
    );
    assert!(
        relay
            .as_str()
            .starts_with(&format!("task-relay-{}-2026-03-02T09:00:00.000000Z-", task.id()))
    );
    assert_eq!(onboarding.as_str(), "user-onboarding-nia");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn lifecycle_starts_within_one_clock_tick_get_distinct_ids(world: World) {
    let service = world.service();

    let first = service
        .start_task_lifecycle(NewTask::new("First"), None)
        .await
        .expect("first lifecycle starts");
    let second = service
        .start_task_lifecycle(NewTask::new("Second"), None)
        .await
        .expect("second lifecycle starts");

    assert_ne!(first, second);
    for id in [first, second] {
        let status = service
            .get_status(id.as_str())
            .await
            .expect("both instances are registered");
        assert_eq!(status.workflow_type, WorkflowType::TaskLifecycle);
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn onboarding_the_same_user_twice_collides(world: World) {
    let service = world.service();
    service
        .start_user_onboarding(UserOnboardingInput::new(user("omar")))
        .await
        .expect("first onboarding starts");

    let result = service
        .start(WorkflowType::UserOnboarding, json!({ "user_id": "omar" }), None)
        .await;

    assert!(matches!(
        result,
        Err(OrchestrationError::Runtime(RuntimeError::AlreadyRunning(_)))
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn generic_start_and_named_signals_drive_a_lifecycle(world: World) {
    let service = world.service();
    let payload = json!({ "title": "Quarterly report", "assignedTo": "pat" });

    let id = service
        .start(WorkflowType::TaskLifecycle, payload, Some("task-lifecycle-report"))
        .await
        .expect("lifecycle starts");
    service
        .signal(id.as_str(), "task_reassigned", Some(json!({ "new_user": "quinn" })))
        .await
        .expect("reassignment accepted");
    service
        .signal_task_completed(id.as_str())
        .await
        .expect("completion accepted");
    let closed = world
        .runtime
        .wait_for_completion(&id, None)
        .await
        .expect("workflow closes");
    let status = service.get_status(id.as_str()).await.expect("status available");

    assert_eq!(closed.status, WorkflowStatus::Completed);
    assert_eq!(status, closed);
    assert_eq!(status.workflow_type, WorkflowType::TaskLifecycle);
    assert_eq!(status.task_queue, "relai-task-queue");
    assert_eq!(world.sent_kinds(), vec![NotificationKind::TaskAssignment]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn reassignment_through_the_service_is_accepted(world: World) {
    let service = world.service();
    let id = service
        .start_task_lifecycle(NewTask::new("Pass it on"), Some("task-lifecycle-pass"))
        .await
        .expect("lifecycle starts");

    service
        .signal_task_reassigned(id.as_str(), user("rae"))
        .await
        .expect("reassignment accepted");

    let status = service.get_status(id.as_str()).await.expect("status available");
    assert_eq!(status.status, WorkflowStatus::Running);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unknown_signal_name_is_rejected_before_routing(world: World) {
    let service = world.service();

    let result = service.signal("task-lifecycle-none", "task_paused", None).await;

    assert!(matches!(
        result,
        Err(OrchestrationError::Workflow(WorkflowError::UnknownSignal(_)))
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn status_of_unknown_workflow_is_not_found(world: World) {
    let result = world.service().get_status("task-relay-nothing").await;
    assert!(matches!(
        result,
        Err(OrchestrationError::Runtime(RuntimeError::NotFound(_)))
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn malformed_payload_is_rejected(world: World) {
    let result = world
        .service()
        .start(WorkflowType::TaskRelay, json!({ "task_id": "not-a-uuid" }), None)
        .await;
    assert!(matches!(
        result,
        Err(OrchestrationError::Workflow(WorkflowError::InvalidInput { .. }))
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn oversized_cleanup_interval_is_refused_before_start(world: World) {
    let result = world
        .service()
        .start(
            WorkflowType::PeriodicCleanup,
            json!({ "cleanup_interval_days": 4_000_000_000_u32 }),
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(OrchestrationError::Workflow(WorkflowError::InvalidInput {
            workflow_type: WorkflowType::PeriodicCleanup,
            ..
        }))
    ));
    assert!(world.instances.is_empty().expect("store readable"));
}
