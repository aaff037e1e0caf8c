//! Orchestration service consumed by the HTTP layer.

use crate::task::domain::{NewTask, TaskId, UserId};
use crate::workflow::{
    activities::TaskActivities,
    domain::{
        PeriodicCleanupInput, TaskRelayInput, UserOnboardingInput, WorkflowDescription,
        WorkflowError, WorkflowId, WorkflowInput, WorkflowSignal, WorkflowType,
    },
    ports::WorkflowInstanceStore,
    runtime::{RuntimeError, WorkflowRuntime},
};
use chrono::SecondsFormat;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Fixed identity of the cleanup singleton.
pub const CLEANUP_SINGLETON_ID: &str = "periodic-cleanup-singleton";

/// Errors returned by the orchestration boundary.
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    /// The request could not be decoded.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The runtime refused the request.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Result type for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Starts workflows, signals running instances and reports their status.
pub struct OrchestrationService<A, R, C> {
    runtime: WorkflowRuntime<A, R, C>,
    clock: Arc<C>,
}

impl<A, R, C> OrchestrationService<A, R, C>
where
    A: TaskActivities + 'static,
    R: WorkflowInstanceStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service over `runtime`.
    #[must_use]
    pub const fn new(runtime: WorkflowRuntime<A, R, C>, clock: Arc<C>) -> Self {
        Self { runtime, clock }
    }

    /// Returns the underlying runtime.
    #[must_use]
    pub const fn runtime(&self) -> &WorkflowRuntime<A, R, C> {
        &self.runtime
    }

    /// Starts a workflow from an untyped payload.
    ///
    /// Cleanup requests always target the singleton identity and succeed
    /// when it is already running; other types derive an identifier when
    /// `workflow_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Workflow`] for malformed payloads and
    /// [`OrchestrationError::Runtime`] when the runtime refuses the start,
    /// including an identifier collision.
    pub async fn start(
        &self,
        workflow_type: WorkflowType,
        payload: Value,
        workflow_id: Option<&str>,
    ) -> OrchestrationResult<WorkflowId> {
        let input = WorkflowInput::from_json(workflow_type, payload)?;
        match input {
            WorkflowInput::PeriodicCleanup(cadence) => self.ensure_cleanup(cadence).await,
            other => {
                let id = match workflow_id {
                    Some(requested) => WorkflowId::new(requested)?,
                    None => self.derive_id(&other)?,
                };
                Ok(self.runtime.start(id, other).await?)
            }
        }
    }

    /// Starts a task lifecycle run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError`] when the identifier is invalid or
    /// already running.
    pub async fn start_task_lifecycle(
        &self,
        task: NewTask,
        workflow_id: Option<&str>,
    ) -> OrchestrationResult<WorkflowId> {
        let input = WorkflowInput::TaskLifecycle(task);
        let id = match workflow_id {
            Some(requested) => WorkflowId::new(requested)?,
            None => self.derive_id(&input)?,
        };
        Ok(self.runtime.start(id, input).await?)
    }

    /// Starts a task relay run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError`] when the runtime refuses the start.
    pub async fn start_task_relay(
        &self,
        task_id: TaskId,
        from_user: UserId,
        to_user: UserId,
        message: Option<String>,
    ) -> OrchestrationResult<WorkflowId> {
        let input = WorkflowInput::TaskRelay(TaskRelayInput {
            task_id,
            from_user,
            to_user,
            message,
        });
        let id = self.derive_id(&input)?;
        Ok(self.runtime.start(id, input).await?)
    }

    /// Starts onboarding for a new user under `user-onboarding-{user_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError`] when the user is already being
    /// onboarded.
    pub async fn start_user_onboarding(
        &self,
        user: UserOnboardingInput,
    ) -> OrchestrationResult<WorkflowId> {
        let input = WorkflowInput::UserOnboarding(user);
        let id = self.derive_id(&input)?;
        Ok(self.runtime.start(id, input).await?)
    }

    /// Ensures the cleanup singleton is running with a one-day interval.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Runtime`] when the runtime cannot be
    /// queried or started.
    pub async fn start_periodic_cleanup(&self) -> OrchestrationResult<WorkflowId> {
        self.ensure_cleanup(PeriodicCleanupInput::default()).await
    }

    /// Signals a lifecycle run that its task is complete.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Runtime`] for unknown or closed
    /// instances.
    pub async fn signal_task_completed(&self, workflow_id: &str) -> OrchestrationResult<()> {
        let id = WorkflowId::new(workflow_id)?;
        Ok(self.runtime.signal(&id, WorkflowSignal::TaskCompleted).await?)
    }

    /// Signals a lifecycle run that its task has a new assignee.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Runtime`] for unknown or closed
    /// instances.
    pub async fn signal_task_reassigned(
        &self,
        workflow_id: &str,
        new_user: UserId,
    ) -> OrchestrationResult<()> {
        let id = WorkflowId::new(workflow_id)?;
        Ok(self
            .runtime
            .signal(&id, WorkflowSignal::TaskReassigned { new_user })
            .await?)
    }

    /// Delivers a signal by name with optional JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Workflow`] for unknown signals or bad
    /// arguments and [`OrchestrationError::Runtime`] when the instance cannot
    /// take the signal.
    pub async fn signal(
        &self,
        workflow_id: &str,
        signal_name: &str,
        args: Option<Value>,
    ) -> OrchestrationResult<()> {
        let id = WorkflowId::new(workflow_id)?;
        let signal = WorkflowSignal::from_parts(signal_name, args)?;
        Ok(self.runtime.signal(&id, signal).await?)
    }

    /// Returns the status of an instance.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Runtime`] for unknown identifiers.
    pub async fn get_status(&self, workflow_id: &str) -> OrchestrationResult<WorkflowDescription> {
        let id = WorkflowId::new(workflow_id)?;
        Ok(self.runtime.describe(&id).await?)
    }

    async fn ensure_cleanup(&self, cadence: PeriodicCleanupInput) -> OrchestrationResult<WorkflowId> {
        let id = WorkflowId::new(CLEANUP_SINGLETON_ID)?;
        match self.runtime.describe(&id).await {
            Ok(existing) if !existing.status.is_closed() => {
                tracing::info!(workflow_id = %id, "periodic cleanup already running");
                return Ok(id);
            }
            Ok(_) | Err(RuntimeError::NotFound(_)) => {}
            Err(other) => return Err(other.into()),
        }
        match self
            .runtime
            .start(id.clone(), WorkflowInput::PeriodicCleanup(cadence))
            .await
        {
            Ok(started) => Ok(started),
            Err(RuntimeError::AlreadyRunning(_)) => {
                tracing::info!(workflow_id = %id, "periodic cleanup already running");
                Ok(id)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn derive_id(&self, input: &WorkflowInput) -> Result<WorkflowId, WorkflowError> {
        let prefix = input.workflow_type().id_prefix();
        let stamp = format!(
            "{}-{}",
            self.clock.utc().to_rfc3339_opts(SecondsFormat::Micros, true),
            Uuid::new_v4().simple()
        );
        match input {
            WorkflowInput::TaskLifecycle(_) => WorkflowId::new(format!("{prefix}-{stamp}")),
            WorkflowInput::TaskRelay(relay) => {
                WorkflowId::new(format!("{prefix}-{}-{stamp}", relay.task_id))
            }
            WorkflowInput::UserOnboarding(user) => {
                WorkflowId::new(format!("{prefix}-{}", user.user_id))
            }
            WorkflowInput::PeriodicCleanup(_) => WorkflowId::new(CLEANUP_SINGLETON_ID),
        }
    }
}
