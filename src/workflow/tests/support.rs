//! Shared fixtures for workflow tests.

use std::sync::Arc;

use crate::notification::{
    adapters::InMemoryNotificationOutbox,
    domain::{Notification, NotificationAck, NotificationKind},
    ports::{NotificationResult, NotificationSink},
};
use crate::task::{
    adapters::memory::{InMemoryTaskStore, InMemoryWorkflowBoard},
    domain::{NewTask, Task, TaskId, TaskPatch, UserId},
    services::{RelayTaskRequest, TaskRecordService},
};
use crate::test_support::FixedClock;
use crate::workflow::{
    activities::{ActivityExecutor, ActivityResult, CleanupReport, DeadlineCheck, TaskActivities},
    adapters::memory::InMemoryWorkflowInstanceStore,
    domain::{WorkflowClosure, WorkflowId, WorkflowInstance, WorkflowSignal, WorkflowState},
    ports::{InstanceStoreResult, WorkflowInstanceStore},
    runtime::{WorkerConfig, WorkflowRuntime},
    services::OrchestrationService,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;

mock! {
    pub Activities {}

    #[async_trait]
    impl TaskActivities for Activities {
        async fn create_task(&self, draft: NewTask) -> ActivityResult<Task>;
        async fn update_task(&self, task_id: TaskId, patch: TaskPatch) -> ActivityResult<Task>;
        async fn assign_task(&self, task_id: TaskId, user: UserId) -> ActivityResult<Task>;
        async fn relay_task(&self, request: RelayTaskRequest) -> ActivityResult<Task>;
        async fn send_notification(&self, notification: Notification) -> ActivityResult<NotificationAck>;
        async fn check_task_deadline(&self, task_id: TaskId) -> ActivityResult<DeadlineCheck>;
        async fn cleanup_completed_tasks(&self, days_old: u32) -> ActivityResult<CleanupReport>;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl NotificationSink for Sink {
        async fn notify(&self, notification: &Notification) -> NotificationResult<NotificationAck>;
    }
}

pub type Outbox = InMemoryNotificationOutbox<FixedClock>;
pub type Records = TaskRecordService<InMemoryTaskStore, InMemoryWorkflowBoard, FixedClock>;
pub type Executor = ActivityExecutor<InMemoryTaskStore, InMemoryWorkflowBoard, Outbox, FixedClock>;
pub type Runtime = WorkflowRuntime<Executor, InMemoryWorkflowInstanceStore, FixedClock>;
pub type MockRuntime = WorkflowRuntime<MockActivities, InMemoryWorkflowInstanceStore, FixedClock>;

pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

pub fn workflow_id(raw: &str) -> WorkflowId {
    WorkflowId::new(raw).expect("valid workflow id")
}

/// Everything a workflow needs, backed by in-memory adapters.
pub struct World {
    pub clock: FixedClock,
    pub tasks: Arc<InMemoryTaskStore>,
    pub board: Arc<InMemoryWorkflowBoard>,
    pub outbox: Arc<Outbox>,
    pub instances: Arc<InMemoryWorkflowInstanceStore>,
    pub runtime: Runtime,
}

impl World {
    pub fn new() -> Self {
        let clock = FixedClock::monday_morning();
        let tasks = Arc::new(InMemoryTaskStore::new());
        let board = Arc::new(InMemoryWorkflowBoard::new());
        let outbox = Arc::new(InMemoryNotificationOutbox::new(Arc::new(clock.clone())));
        let instances = Arc::new(InMemoryWorkflowInstanceStore::new());
        let runtime = Self::runtime_over(&clock, &tasks, &board, &outbox, &instances);
        Self {
            clock,
            tasks,
            board,
            outbox,
            instances,
            runtime,
        }
    }

    /// Builds a second runtime over the same stores, as a restarted worker
    /// would.
    pub fn restarted_runtime(&self) -> Runtime {
        Self::runtime_over(
            &self.clock,
            &self.tasks,
            &self.board,
            &self.outbox,
            &self.instances,
        )
    }

    fn runtime_over(
        clock: &FixedClock,
        tasks: &Arc<InMemoryTaskStore>,
        board: &Arc<InMemoryWorkflowBoard>,
        outbox: &Arc<Outbox>,
        instances: &Arc<InMemoryWorkflowInstanceStore>,
    ) -> Runtime {
        let shared_clock = Arc::new(clock.clone());
        let records = TaskRecordService::new(
            Arc::clone(tasks),
            Arc::clone(board),
            Arc::clone(&shared_clock),
        );
        let executor = ActivityExecutor::new(records, Arc::clone(outbox), Arc::clone(&shared_clock));
        WorkflowRuntime::new(
            WorkerConfig::default(),
            Arc::new(executor),
            Arc::clone(instances),
            shared_clock,
        )
    }

    /// Builds an activity executor over the world's task stores and outbox.
    pub fn executor(&self) -> Executor {
        ActivityExecutor::new(
            self.records(),
            Arc::clone(&self.outbox),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn records(&self) -> Records {
        TaskRecordService::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.board),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn service(&self) -> OrchestrationService<Executor, InMemoryWorkflowInstanceStore, FixedClock> {
        OrchestrationService::new(self.runtime.clone(), Arc::new(self.clock.clone()))
    }

    pub fn sent_kinds(&self) -> Vec<NotificationKind> {
        self.outbox
            .sent()
            .expect("outbox readable")
            .iter()
            .map(Notification::kind)
            .collect()
    }

    pub fn sent_of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.outbox.sent_of_kind(kind).expect("outbox readable")
    }

    pub async fn seed_task(&self, draft: NewTask) -> Task {
        self.records().create(draft).await.expect("seed task")
    }
}

pub fn mock_runtime(activities: MockActivities) -> (MockRuntime, Arc<InMemoryWorkflowInstanceStore>, FixedClock) {
    let clock = FixedClock::monday_morning();
    let instances = Arc::new(InMemoryWorkflowInstanceStore::new());
    let runtime = WorkflowRuntime::new(
        WorkerConfig::default(),
        Arc::new(activities),
        Arc::clone(&instances),
        Arc::new(clock.clone()),
    );
    (runtime, instances, clock)
}

pub fn sample_task(title: &str) -> Task {
    Task::create(NewTask::new(title), &FixedClock::monday_morning()).expect("valid task")
}

pub fn ack(notification: &Notification) -> NotificationAck {
    NotificationAck {
        user_id: notification.user().clone(),
        kind: notification.kind(),
        sent_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Instance store that yields to the scheduler after every insert, widening
/// the window between a start being stored and being spawned.
#[derive(Default)]
pub struct YieldingInstanceStore {
    inner: InMemoryWorkflowInstanceStore,
}

#[async_trait]
impl WorkflowInstanceStore for YieldingInstanceStore {
    async fn insert(&self, instance: &WorkflowInstance) -> InstanceStoreResult<()> {
        self.inner.insert(instance).await?;
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn save_checkpoint(
        &self,
        id: &WorkflowId,
        state: &WorkflowState,
        consumed_signals: usize,
    ) -> InstanceStoreResult<()> {
        self.inner.save_checkpoint(id, state, consumed_signals).await
    }

    async fn append_signal(
        &self,
        id: &WorkflowId,
        signal: WorkflowSignal,
    ) -> InstanceStoreResult<()> {
        self.inner.append_signal(id, signal).await
    }

    async fn pending_signals(&self, id: &WorkflowId) -> InstanceStoreResult<Vec<WorkflowSignal>> {
        self.inner.pending_signals(id).await
    }

    async fn close(
        &self,
        id: &WorkflowId,
        closure: WorkflowClosure,
        closed_at: DateTime<Utc>,
    ) -> InstanceStoreResult<WorkflowInstance> {
        self.inner.close(id, closure, closed_at).await
    }

    async fn find(&self, id: &WorkflowId) -> InstanceStoreResult<Option<WorkflowInstance>> {
        self.inner.find(id).await
    }

    async fn list_running(&self) -> InstanceStoreResult<Vec<WorkflowInstance>> {
        self.inner.list_running().await
    }

    async fn purge_closed_before(&self, cutoff: DateTime<Utc>) -> InstanceStoreResult<u64> {
        self.inner.purge_closed_before(cutoff).await
    }
}
