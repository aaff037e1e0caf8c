//! Durable storage for workflow instances.

use crate::workflow::domain::{
    WorkflowClosure, WorkflowError, WorkflowId, WorkflowInstance, WorkflowSignal, WorkflowState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for instance store operations.
pub type InstanceStoreResult<T> = Result<T, InstanceStoreError>;

/// Persistence contract for workflow instances.
///
/// One record is kept per workflow identifier. A closed record is replaced
/// when the identifier is started again.
#[async_trait]
pub trait WorkflowInstanceStore: Send + Sync {
    /// Inserts a freshly started instance.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceStoreError::AlreadyRunning`] when a running instance
    /// holds the same identifier.
    async fn insert(&self, instance: &WorkflowInstance) -> InstanceStoreResult<()>;

    /// Persists a checkpoint and drops the first `consumed_signals` pending
    /// signals in the same write.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceStoreError::NotFound`] or
    /// [`InstanceStoreError::NotRunning`] when the instance cannot accept the
    /// checkpoint.
    async fn save_checkpoint(
        &self,
        id: &WorkflowId,
        state: &WorkflowState,
        consumed_signals: usize,
    ) -> InstanceStoreResult<()>;

    /// Appends a signal to a running instance's inbox.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceStoreError::NotFound`] for unknown identifiers and
    /// [`InstanceStoreError::NotRunning`] for closed instances.
    async fn append_signal(&self, id: &WorkflowId, signal: WorkflowSignal)
    -> InstanceStoreResult<()>;

    /// Returns the signals delivered but not yet consumed, oldest first.
    async fn pending_signals(&self, id: &WorkflowId) -> InstanceStoreResult<Vec<WorkflowSignal>>;

    /// Records the terminal status of a running instance and returns the
    /// closed record.
    async fn close(
        &self,
        id: &WorkflowId,
        closure: WorkflowClosure,
        closed_at: DateTime<Utc>,
    ) -> InstanceStoreResult<WorkflowInstance>;

    /// Finds an instance by identifier.
    async fn find(&self, id: &WorkflowId) -> InstanceStoreResult<Option<WorkflowInstance>>;

    /// Lists every running instance.
    async fn list_running(&self) -> InstanceStoreResult<Vec<WorkflowInstance>>;

    /// Removes instances closed before `cutoff` and returns how many were
    /// removed.
    async fn purge_closed_before(&self, cutoff: DateTime<Utc>) -> InstanceStoreResult<u64>;
}

/// Errors returned by instance store implementations.
#[derive(Debug, Clone, Error)]
pub enum InstanceStoreError {
    /// A running instance already holds the identifier.
    #[error("workflow already running: {0}")]
    AlreadyRunning(WorkflowId),

    /// No instance holds the identifier.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The instance has already closed.
    #[error("workflow is not running: {0}")]
    NotRunning(WorkflowId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InstanceStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<InstanceStoreError> for WorkflowError {
    fn from(err: InstanceStoreError) -> Self {
        Self::persistence(err)
    }
}
