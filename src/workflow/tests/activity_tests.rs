//! Activity executor and deadline evaluation tests.

use super::support::{Executor, MockSink, World, sample_task, user};
use crate::notification::{
    domain::{Notification, NotificationKind},
    ports::NotificationError,
};
use crate::task::{
    domain::{NewTask, TaskId, TaskPatch, TaskStatus},
    ports::WorkflowBoard,
    services::{RelayTaskRequest, TaskRecordService},
};
use crate::test_support::FixedClock;
use crate::workflow::activities::{
    ActivityExecutor, ActivityFailure, DeadlineCheck, TaskActivities,
};
use chrono::TimeDelta;
use mockable::Clock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn world() -> World {
    World::new()
}

fn executor(world: &World) -> Executor {
    let clock = Arc::new(world.clock.clone());
    let records = TaskRecordService::new(
        Arc::clone(&world.tasks),
        Arc::clone(&world.board),
        Arc::clone(&clock),
    );
    Executor::new(records, Arc::clone(&world.outbox), clock)
}

#[rstest]
#[case(TimeDelta::hours(12), true, false)]
#[case(TimeDelta::hours(24), true, false)]
#[case(TimeDelta::hours(25), false, false)]
#[case(TimeDelta::zero(), false, true)]
#[case(TimeDelta::hours(-1), false, true)]
fn deadline_classification(
    #[case] offset: TimeDelta,
    #[case] approaching: bool,
    #[case] overdue: bool,
) {
    let clock = FixedClock::monday_morning();
    let now = clock.utc();
    let check = DeadlineCheck::at(TaskId::new(), now + offset, now);

    assert!(check.has_deadline);
    assert_eq!(check.is_approaching, approaching);
    assert_eq!(check.is_overdue, overdue);
    assert_eq!(check.time_remaining_seconds, Some(offset.num_seconds()));
}

#[rstest]
fn task_without_estimate_has_no_deadline() {
    let task = sample_task("Open ended");
    let check = DeadlineCheck::evaluate(&task, FixedClock::monday_morning().utc())
        .expect("evaluation succeeds");
    assert_eq!(check, DeadlineCheck::without_deadline(task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unparsable_deadline_is_a_permanent_failure(world: World) {
    let task = world
        .seed_task(NewTask::new("Soon").with_estimated_handoff("in two hours"))
        .await;

    let result = executor(&world).check_task_deadline(task.id()).await;

    let failure = result.expect_err("deadline should not parse");
    assert!(!failure.retryable);
    assert!(failure.message.starts_with("invalid deadline format"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deadline_check_reads_current_clock(world: World) {
    let task = world
        .seed_task(NewTask::new("Due tomorrow").with_estimated_handoff("2026-03-03T09:00:00Z"))
        .await;
    let activities = executor(&world);

    let early = activities
        .check_task_deadline(task.id())
        .await
        .expect("check succeeds");
    world.clock.advance(TimeDelta::hours(25));
    let late = activities
        .check_task_deadline(task.id())
        .await
        .expect("check succeeds");

    assert!(early.is_approaching);
    assert!(!early.is_overdue);
    assert!(late.is_overdue);
    assert_eq!(late.time_remaining_seconds, Some(-3600));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deadline_check_of_missing_task_is_permanent(world: World) {
    let missing = TaskId::new();
    let failure = executor(&world)
        .check_task_deadline(missing)
        .await
        .expect_err("task is missing");
    assert_eq!(failure, ActivityFailure::permanent(format!("task not found: {missing}")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_activity_updates_task_and_board(world: World) {
    let task = world.seed_task(NewTask::new("Assign me")).await;

    let assigned = executor(&world)
        .assign_task(task.id(), user("alice"))
        .await
        .expect("assign succeeds");
    let board = world
        .board
        .board_for(&user("alice"))
        .await
        .expect("board readable");

    assert_eq!(assigned.assigned_to(), Some(&user("alice")));
    assert_eq!(board.active_work.map(|work| work.task_id), Some(task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relay_to_self_is_not_retryable(world: World) {
    let task = world
        .seed_task(NewTask::new("Mine").with_assignee(user("alice")))
        .await;

    let failure = executor(&world)
        .relay_task(RelayTaskRequest::new(task.id(), user("alice"), user("alice")))
        .await
        .expect_err("self relay is rejected");

    assert!(!failure.retryable);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_activity_applies_patch(world: World) {
    let task = world.seed_task(NewTask::new("Patch me")).await;

    let updated = executor(&world)
        .update_task(task.id(), TaskPatch::status(TaskStatus::Completed))
        .await
        .expect("update succeeds");

    assert_eq!(updated.status(), TaskStatus::Completed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleanup_activity_reports_removed_count(world: World) {
    world
        .seed_task(NewTask::new("Done long ago").with_status(TaskStatus::Completed))
        .await;
    world.clock.advance(TimeDelta::days(31));

    let report = executor(&world)
        .cleanup_completed_tasks(30)
        .await
        .expect("cleanup succeeds");

    assert_eq!(report.cleaned_count, 1);
    assert_eq!(report.cutoff, world.clock.utc() - TimeDelta::days(30));
    assert!(world.tasks.is_empty().expect("store readable"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notification_activity_reaches_the_sink(world: World) {
    let ack = executor(&world)
        .send_notification(Notification::new(
            user("alice"),
            "Welcome!",
            NotificationKind::Welcome,
        ))
        .await
        .expect("send succeeds");

    assert_eq!(ack.user_id, user("alice"));
    assert_eq!(world.sent_kinds(), vec![NotificationKind::Welcome]);
}

#[rstest]
#[case(NotificationError::Rejected("user opted out".to_owned()), false)]
#[case(NotificationError::unavailable(std::io::Error::other("smtp relay down")), true)]
#[tokio::test(flavor = "multi_thread")]
async fn sink_errors_keep_their_retryability(
    world: World,
    #[case] error: NotificationError,
    #[case] retryable: bool,
) {
    let mut sink = MockSink::new();
    sink.expect_notify()
        .times(1)
        .returning(move |_| Err(error.clone()));
    let activities = ActivityExecutor::new(
        world.records(),
        Arc::new(sink),
        Arc::new(world.clock.clone()),
    );

    let failure = activities
        .send_notification(Notification::new(user("alice"), "Hello", NotificationKind::Info))
        .await
        .expect_err("sink refuses the notification");

    assert_eq!(failure.retryable, retryable);
}
