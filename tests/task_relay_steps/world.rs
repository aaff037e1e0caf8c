//! Shared world state for task relay BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use relai::notification::adapters::InMemoryNotificationOutbox;
use relai::task::{
    adapters::memory::{InMemoryTaskStore, InMemoryWorkflowBoard},
    domain::{TaskId, UserId},
    services::TaskRecordService,
};
use relai::workflow::{
    activities::ActivityExecutor,
    adapters::memory::InMemoryWorkflowInstanceStore,
    domain::WorkflowDescription,
    runtime::{WorkerConfig, WorkflowRuntime},
    services::OrchestrationService,
};
use rstest::fixture;

/// Record service type used by the BDD world.
pub type TestRecords = TaskRecordService<InMemoryTaskStore, InMemoryWorkflowBoard, DefaultClock>;

/// Orchestration service type used by the BDD world.
pub type TestService = OrchestrationService<
    ActivityExecutor<
        InMemoryTaskStore,
        InMemoryWorkflowBoard,
        InMemoryNotificationOutbox<DefaultClock>,
        DefaultClock,
    >,
    InMemoryWorkflowInstanceStore,
    DefaultClock,
>;

/// Scenario world for task relay behaviour tests.
pub struct RelayWorld {
    pub records: TestRecords,
    pub service: TestService,
    pub outbox: Arc<InMemoryNotificationOutbox<DefaultClock>>,
    pub task_id: Option<TaskId>,
    pub outcome: Option<WorkflowDescription>,
}

impl RelayWorld {
    /// Creates a world with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let tasks = Arc::new(InMemoryTaskStore::new());
        let board = Arc::new(InMemoryWorkflowBoard::new());
        let records = TaskRecordService::new(
            Arc::clone(&tasks),
            Arc::clone(&board),
            Arc::clone(&clock),
        );
        let outbox = Arc::new(InMemoryNotificationOutbox::new(Arc::clone(&clock)));
        let executor = ActivityExecutor::new(
            TaskRecordService::new(tasks, board, Arc::clone(&clock)),
            Arc::clone(&outbox),
            Arc::clone(&clock),
        );
        let runtime = WorkflowRuntime::new(
            WorkerConfig::default(),
            Arc::new(executor),
            Arc::new(InMemoryWorkflowInstanceStore::new()),
            Arc::clone(&clock),
        );

        Self {
            records,
            service: OrchestrationService::new(runtime, clock),
            outbox,
            task_id: None,
            outcome: None,
        }
    }

    /// Returns the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no task step has run.
    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for RelayWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RelayWorld {
    RelayWorld::default()
}

/// Parses a user identifier from step text.
///
/// # Errors
///
/// Returns an error for blank names.
pub fn user(name: &str) -> Result<UserId, eyre::Report> {
    Ok(UserId::new(name)?)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
