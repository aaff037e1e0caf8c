//! Runs the workflow worker.
//!
//! Usage:
//!
//! ```text
//! relai_worker [config-path]
//! ```
//!
//! The optional JSON file at `config-path` deserialises into a
//! [`WorkerConfig`]; `RELAI_*` environment variables override it. A
//! representative file is:
//!
//! ```json
//! {
//!   "namespace": "default",
//!   "task_queue": "relai-task-queue",
//!   "max_concurrent_activities": 16,
//!   "closed_retention_days": 7,
//!   "state_dir": "relai-state"
//! }
//! ```
//!
//! Workflow instances persist as JSON under `state_dir`, so a restarted
//! worker picks up where the previous one stopped. The worker resumes open
//! instances, makes sure the cleanup singleton is
//! running, purges expired closed instances hourly and exits on Ctrl-C.

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use relai::notification::adapters::LoggingNotificationSink;
use relai::task::adapters::memory::{InMemoryTaskStore, InMemoryWorkflowBoard};
use relai::task::services::TaskRecordService;
use relai::telemetry;
use relai::workflow::activities::ActivityExecutor;
use relai::workflow::adapters::file::FileWorkflowInstanceStore;
use relai::workflow::runtime::{ConfigError, WorkerConfig, WorkflowRuntime};
use relai::workflow::services::OrchestrationService;
use std::sync::Arc;
use std::time::Duration;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    telemetry::init_tracing();
    let config = load_config(std::env::args().nth(1).map(Utf8PathBuf::from))?;
    tracing::info!(
        namespace = %config.namespace,
        task_queue = %config.task_queue,
        max_concurrent_activities = config.max_concurrent_activities,
        state_dir = %config.state_dir,
        "starting worker"
    );

    let clock = Arc::new(DefaultClock);
    let records = TaskRecordService::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(InMemoryWorkflowBoard::new()),
        Arc::clone(&clock),
    );
    let sink = Arc::new(LoggingNotificationSink::new(Arc::clone(&clock)));
    let activities = Arc::new(ActivityExecutor::new(records, sink, Arc::clone(&clock)));
    let store = Arc::new(FileWorkflowInstanceStore::open(&config.state_dir).await?);
    let runtime = WorkflowRuntime::new(config, activities, store, Arc::clone(&clock));

    let recovered = runtime.recover().await?;
    tracing::info!(recovered, "open workflows resumed");
    let service = OrchestrationService::new(runtime.clone(), clock);
    service.start_periodic_cleanup().await?;

    let mut purge = tokio::time::interval(PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = purge.tick() => {
                if let Err(err) = runtime.purge_closed().await {
                    tracing::warn!(error = %err, "purging closed workflows failed");
                }
            }
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    runtime.shutdown().await;
    Ok(())
}

fn load_config(path: Option<Utf8PathBuf>) -> Result<WorkerConfig, ConfigError> {
    let base = match path {
        Some(config_path) => WorkerConfig::load(&config_path)?,
        None => WorkerConfig::default(),
    };
    base.with_process_env()
}
