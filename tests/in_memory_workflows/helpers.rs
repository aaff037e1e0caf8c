//! Shared worker harness for in-memory workflow integration tests.

use mockable::DefaultClock;
use relai::notification::{adapters::InMemoryNotificationOutbox, domain::NotificationKind};
use relai::task::{
    adapters::memory::{InMemoryTaskStore, InMemoryWorkflowBoard},
    domain::{NewTask, Task},
    services::TaskRecordService,
};
use relai::workflow::{
    activities::ActivityExecutor,
    adapters::memory::InMemoryWorkflowInstanceStore,
    runtime::{WorkerConfig, WorkflowRuntime},
    services::OrchestrationService,
};
use rstest::fixture;
use std::sync::Arc;

/// Notification sink that keeps every notification.
pub type TestOutbox = InMemoryNotificationOutbox<DefaultClock>;

/// Activity executor wired to the in-memory adapters.
pub type TestExecutor =
    ActivityExecutor<InMemoryTaskStore, InMemoryWorkflowBoard, TestOutbox, DefaultClock>;

/// Runtime type used by the integration tests.
pub type TestRuntime = WorkflowRuntime<TestExecutor, InMemoryWorkflowInstanceStore, DefaultClock>;

/// Orchestration service type used by the integration tests.
pub type TestService =
    OrchestrationService<TestExecutor, InMemoryWorkflowInstanceStore, DefaultClock>;

/// A worker process and the stores it writes to.
pub struct Worker {
    pub service: TestService,
    pub tasks: Arc<InMemoryTaskStore>,
    pub board: Arc<InMemoryWorkflowBoard>,
    pub outbox: Arc<TestOutbox>,
    pub instances: Arc<InMemoryWorkflowInstanceStore>,
}

impl Worker {
    /// Creates a worker over empty stores.
    #[must_use]
    pub fn new() -> Self {
        let outbox = Arc::new(InMemoryNotificationOutbox::new(Arc::new(DefaultClock)));
        Self::over(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(InMemoryWorkflowBoard::new()),
            outbox,
            Arc::new(InMemoryWorkflowInstanceStore::new()),
        )
    }

    fn over(
        tasks: Arc<InMemoryTaskStore>,
        board: Arc<InMemoryWorkflowBoard>,
        outbox: Arc<TestOutbox>,
        instances: Arc<InMemoryWorkflowInstanceStore>,
    ) -> Self {
        let clock = Arc::new(DefaultClock);
        let records = TaskRecordService::new(
            Arc::clone(&tasks),
            Arc::clone(&board),
            Arc::clone(&clock),
        );
        let executor = ActivityExecutor::new(records, Arc::clone(&outbox), Arc::clone(&clock));
        let runtime = WorkflowRuntime::new(
            WorkerConfig::default(),
            Arc::new(executor),
            Arc::clone(&instances),
            Arc::clone(&clock),
        );
        Self {
            service: OrchestrationService::new(runtime, clock),
            tasks,
            board,
            outbox,
            instances,
        }
    }

    /// Returns a second worker sharing this worker's stores, as after a
    /// process restart.
    #[must_use]
    pub fn restarted(&self) -> Self {
        Self::over(
            Arc::clone(&self.tasks),
            Arc::clone(&self.board),
            Arc::clone(&self.outbox),
            Arc::clone(&self.instances),
        )
    }

    /// Returns the worker's runtime.
    #[must_use]
    pub const fn runtime(&self) -> &TestRuntime {
        self.service.runtime()
    }

    /// Creates a task directly through the record service.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is invalid.
    pub async fn seed_task(&self, draft: NewTask) -> Result<Task, eyre::Report> {
        let records = TaskRecordService::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.board),
            Arc::new(DefaultClock),
        );
        Ok(records.create(draft).await?)
    }

    /// Returns the kinds of every notification sent so far, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbox cannot be read.
    pub fn sent_kinds(&self) -> Result<Vec<NotificationKind>, eyre::Report> {
        Ok(self
            .outbox
            .sent()?
            .iter()
            .map(relai::notification::domain::Notification::kind)
            .collect())
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides a fresh worker for each test.
#[fixture]
pub fn worker() -> Worker {
    Worker::new()
}
