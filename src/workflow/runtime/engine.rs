//! Workflow runtime: executes instances on tokio and keeps the instance
//! store up to date.
//!
//! Each running instance is one spawned task driving its definition, wrapped
//! by a supervisor that applies the execution timeout, turns panics into
//! failures and records the closure. Activity attempts across all instances
//! share one semaphore sized by [`WorkerConfig::max_concurrent_activities`].

use super::{WorkerConfig, WorkflowContext};
use crate::workflow::{
    activities::TaskActivities,
    definitions,
    domain::{
        WorkflowClosure, WorkflowDescription, WorkflowId, WorkflowInput, WorkflowInstance,
        WorkflowSignal, WorkflowStatus, WorkflowType,
    },
    policy::ActivityPolicies,
    ports::{InstanceStoreError, WorkflowInstanceStore},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::task::{AbortHandle, JoinError};

/// Errors returned by runtime operations.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A running instance already holds the identifier.
    #[error("workflow already running: {0}")]
    AlreadyRunning(WorkflowId),

    /// No instance holds the identifier.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The instance has already closed.
    #[error("workflow is not running: {0}")]
    NotRunning(WorkflowId),

    /// The workflow type does not handle the signal.
    #[error("{workflow_type} does not accept signal {signal}")]
    UnsupportedSignal {
        /// Workflow type of the target instance.
        workflow_type: WorkflowType,
        /// Signal name.
        signal: &'static str,
    },

    /// The instance did not close within the caller's wait limit.
    #[error("timed out waiting for workflow {0}")]
    WaitTimedOut(WorkflowId),

    /// The runtime no longer accepts new work.
    #[error("workflow runtime is shut down")]
    ShutDown,

    /// The instance store failed.
    #[error(transparent)]
    Store(InstanceStoreError),
}

impl From<InstanceStoreError> for RuntimeError {
    fn from(err: InstanceStoreError) -> Self {
        match err {
            InstanceStoreError::AlreadyRunning(id) => Self::AlreadyRunning(id),
            InstanceStoreError::NotFound(id) => Self::NotFound(id),
            InstanceStoreError::NotRunning(id) => Self::NotRunning(id),
            InstanceStoreError::Persistence(_) => Self::Store(err),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

struct Execution {
    abort: AbortHandle,
    done: Arc<Notify>,
}

struct RuntimeInner<A, R, C> {
    config: WorkerConfig,
    activities: Arc<A>,
    store: Arc<R>,
    clock: Arc<C>,
    policies: Arc<ActivityPolicies>,
    limiter: Arc<Semaphore>,
    executions: Mutex<HashMap<WorkflowId, Execution>>,
    accepting: AtomicBool,
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Executes workflow instances and routes signals to them.
pub struct WorkflowRuntime<A, R, C> {
    inner: Arc<RuntimeInner<A, R, C>>,
}

impl<A, R, C> Clone for WorkflowRuntime<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R, C> WorkflowRuntime<A, R, C>
where
    A: TaskActivities + 'static,
    R: WorkflowInstanceStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a runtime with the built-in activity policies.
    #[must_use]
    pub fn new(config: WorkerConfig, activities: Arc<A>, store: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_policies(config, activities, store, clock, ActivityPolicies::default())
    }

    /// Creates a runtime with a custom policy table.
    #[must_use]
    pub fn with_policies(
        config: WorkerConfig,
        activities: Arc<A>,
        store: Arc<R>,
        clock: Arc<C>,
        policies: ActivityPolicies,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_activities));
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                activities,
                store,
                clock,
                policies: Arc::new(policies),
                limiter,
                executions: Mutex::new(HashMap::new()),
                accepting: AtomicBool::new(true),
            }),
        }
    }

    /// Returns the worker configuration.
    #[must_use]
    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Starts a new instance under `workflow_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AlreadyRunning`] when a running instance holds
    /// the identifier, [`RuntimeError::ShutDown`] after [`Self::shutdown`], or
    /// a store error.
    pub async fn start(
        &self,
        workflow_id: WorkflowId,
        input: WorkflowInput,
    ) -> RuntimeResult<WorkflowId> {
        self.ensure_accepting()?;
        let instance = WorkflowInstance::start(
            workflow_id.clone(),
            input,
            self.inner.config.task_queue.clone(),
            self.inner.clock.utc(),
        );
        self.inner.store.insert(&instance).await?;
        tracing::info!(
            %workflow_id,
            workflow_type = %instance.workflow_type(),
            task_queue = %self.inner.config.task_queue,
            "workflow started"
        );
        self.spawn(instance).await;
        Ok(workflow_id)
    }

    /// Delivers a signal to a running instance.
    ///
    /// The signal is queued in the instance's inbox and takes effect at the
    /// definition's next yield point.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`], [`RuntimeError::NotRunning`] or
    /// [`RuntimeError::UnsupportedSignal`] when the instance cannot take the
    /// signal.
    pub async fn signal(&self, workflow_id: &WorkflowId, signal: WorkflowSignal) -> RuntimeResult<()> {
        let instance = self
            .inner
            .store
            .find(workflow_id)
            .await?
            .ok_or_else(|| RuntimeError::NotFound(workflow_id.clone()))?;
        if instance.status().is_closed() {
            return Err(RuntimeError::NotRunning(workflow_id.clone()));
        }
        if !instance.workflow_type().accepts(&signal) {
            return Err(RuntimeError::UnsupportedSignal {
                workflow_type: instance.workflow_type(),
                signal: signal.name(),
            });
        }
        let name = signal.name();
        self.inner.store.append_signal(workflow_id, signal).await?;
        tracing::info!(%workflow_id, signal = name, "signal delivered");
        Ok(())
    }

    /// Returns the status view of an instance.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for unknown identifiers.
    pub async fn describe(&self, workflow_id: &WorkflowId) -> RuntimeResult<WorkflowDescription> {
        self.inner
            .store
            .find(workflow_id)
            .await?
            .map(|instance| instance.describe())
            .ok_or_else(|| RuntimeError::NotFound(workflow_id.clone()))
    }

    /// Waits until the instance closes and returns its final status view.
    ///
    /// An instance that is open in the store but not executing in this
    /// runtime is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::WaitTimedOut`] when `limit` elapses first, or
    /// [`RuntimeError::NotFound`] for unknown identifiers.
    pub async fn wait_for_completion(
        &self,
        workflow_id: &WorkflowId,
        limit: Option<Duration>,
    ) -> RuntimeResult<WorkflowDescription> {
        let waiting = self.wait_closed(workflow_id);
        match limit {
            Some(duration) => tokio::time::timeout(duration, waiting)
                .await
                .map_err(|_| RuntimeError::WaitTimedOut(workflow_id.clone()))?,
            None => waiting.await,
        }
    }

    async fn wait_closed(&self, workflow_id: &WorkflowId) -> RuntimeResult<WorkflowDescription> {
        loop {
            let done = self
                .inner
                .executions
                .lock()
                .await
                .get(workflow_id)
                .map(|execution| Arc::clone(&execution.done));
            let Some(done) = done else {
                return self.describe(workflow_id).await;
            };
            let notified = done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let description = self.describe(workflow_id).await?;
            if description.status.is_closed() {
                return Ok(description);
            }
            notified.await;
        }
    }

    /// Resumes every running instance in the store that is not already
    /// executing here, and returns how many were resumed.
    ///
    /// # Errors
    ///
    /// Returns a store error when the running instances cannot be listed.
    pub async fn recover(&self) -> RuntimeResult<usize> {
        self.ensure_accepting()?;
        let mut resumed = 0_usize;
        for listed in self.inner.store.list_running().await? {
            if self.resume(listed.workflow_id()).await? {
                tracing::info!(
                    workflow_id = %listed.workflow_id(),
                    workflow_type = %listed.workflow_type(),
                    "workflow recovered"
                );
                resumed = resumed.saturating_add(1);
            }
        }
        Ok(resumed)
    }

    /// Removes instances closed longer ago than the retention period.
    ///
    /// # Errors
    ///
    /// Returns a store error when the purge fails.
    pub async fn purge_closed(&self) -> RuntimeResult<u64> {
        let cutoff = self.inner.clock.utc() - self.inner.config.closed_retention();
        let removed = self.inner.store.purge_closed_before(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, %cutoff, "closed workflows purged");
        }
        Ok(removed)
    }

    /// Returns how many instances are executing in this runtime.
    pub async fn executing(&self) -> usize {
        self.inner.executions.lock().await.len()
    }

    /// Stops accepting work and aborts every executing instance.
    ///
    /// Aborted instances stay open in the store with their last checkpoint,
    /// ready for [`Self::recover`].
    pub async fn shutdown(&self) {
        self.inner.accepting.store(false, Ordering::SeqCst);
        let mut executions = self.inner.executions.lock().await;
        for (workflow_id, execution) in executions.drain() {
            execution.abort.abort();
            execution.done.notify_waiters();
            tracing::info!(%workflow_id, "workflow execution aborted");
        }
    }

    fn ensure_accepting(&self) -> RuntimeResult<()> {
        if self.inner.accepting.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RuntimeError::ShutDown)
        }
    }

    fn context_for(&self, workflow_id: WorkflowId) -> WorkflowContext<A, R, C> {
        WorkflowContext::new(
            workflow_id,
            Arc::clone(&self.inner.activities),
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.clock),
            Arc::clone(&self.inner.policies),
            Arc::clone(&self.inner.limiter),
        )
    }

    /// Spawns the instance unless it is already executing here.
    async fn spawn(&self, instance: WorkflowInstance) -> bool {
        let mut executions = self.inner.executions.lock().await;
        if executions.contains_key(instance.workflow_id()) {
            return false;
        }
        self.launch(&mut executions, instance);
        true
    }

    /// Reloads a running instance and spawns it unless it is already
    /// executing here.
    ///
    /// The executions lock is held across the reload: a finishing instance
    /// closes in the store before it leaves the map, so a stale listing
    /// never respawns a closed instance.
    async fn resume(&self, workflow_id: &WorkflowId) -> RuntimeResult<bool> {
        let mut executions = self.inner.executions.lock().await;
        if executions.contains_key(workflow_id) {
            return Ok(false);
        }
        let Some(instance) = self.inner.store.find(workflow_id).await? else {
            return Ok(false);
        };
        if instance.status().is_closed() {
            return Ok(false);
        }
        self.launch(&mut executions, instance);
        Ok(true)
    }

    fn launch(&self, executions: &mut HashMap<WorkflowId, Execution>, instance: WorkflowInstance) {
        let workflow_id = instance.workflow_id().clone();
        let done = Arc::new(Notify::new());
        let handle = tokio::spawn(self.clone().supervise(instance, Arc::clone(&done)));
        executions.insert(
            workflow_id,
            Execution {
                abort: handle.abort_handle(),
                done,
            },
        );
    }

    async fn supervise(self, instance: WorkflowInstance, done: Arc<Notify>) {
        let workflow_id = instance.workflow_id().clone();
        let remaining = (instance.execution_deadline() - self.inner.clock.utc())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let context = self.context_for(workflow_id.clone());
        let body = tokio::spawn(definitions::run(
            context,
            instance.input().clone(),
            instance.state().clone(),
        ));
        let guard = AbortOnDrop(body.abort_handle());

        let closure = match tokio::time::timeout(remaining, body).await {
            Err(_) => WorkflowClosure::TimedOut,
            Ok(Err(join_error)) => WorkflowClosure::fault(panic_message(join_error)),
            Ok(Ok(Err(workflow_error))) => WorkflowClosure::fault(workflow_error.to_string()),
            Ok(Ok(Ok(output))) => WorkflowClosure::from_output(output),
        };
        drop(guard);
        self.finish(&workflow_id, closure, &done).await;
    }

    async fn finish(&self, workflow_id: &WorkflowId, closure: WorkflowClosure, done: &Arc<Notify>) {
        match self
            .inner
            .store
            .close(workflow_id, closure, self.inner.clock.utc())
            .await
        {
            Ok(closed) => log_closure(&closed),
            Err(err) => {
                tracing::error!(%workflow_id, error = %err, "failed to record workflow closure");
            }
        }

        let mut executions = self.inner.executions.lock().await;
        if executions
            .get(workflow_id)
            .is_some_and(|execution| Arc::ptr_eq(&execution.done, done))
        {
            executions.remove(workflow_id);
        }
        drop(executions);
        done.notify_waiters();
    }
}

fn log_closure(closed: &WorkflowInstance) {
    let description = closed.describe();
    match description.status {
        WorkflowStatus::Completed => tracing::info!(
            workflow_id = %description.workflow_id,
            workflow_type = %description.workflow_type,
            "workflow completed"
        ),
        WorkflowStatus::Failed | WorkflowStatus::TimedOut | WorkflowStatus::Running => {
            tracing::warn!(
                workflow_id = %description.workflow_id,
                workflow_type = %description.workflow_type,
                status = %description.status,
                error = description.error.as_deref().unwrap_or_default(),
                "workflow closed without success"
            );
        }
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .map_or_else(
                || "workflow panicked".to_owned(),
                |message| format!("workflow panicked: {message}"),
            ),
        Err(other) => other.to_string(),
    }
}
