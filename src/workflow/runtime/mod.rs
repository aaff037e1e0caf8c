//! Durable execution substrate for workflow instances.

mod config;
mod context;
mod engine;

pub use config::{
    ConfigError, MAX_CONCURRENT_ACTIVITIES_ENV, NAMESPACE_ENV, RETENTION_DAYS_ENV, STATE_DIR_ENV,
    TASK_QUEUE_ENV, WorkerConfig,
};
pub use context::WorkflowContext;
pub use engine::{RuntimeError, RuntimeResult, WorkflowRuntime};
