//! In-memory workflow instance store.
//!
//! Cloning the store shares its state, so a second runtime built from a clone
//! sees the first runtime's checkpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{WorkflowClosure, WorkflowId, WorkflowInstance, WorkflowSignal, WorkflowState},
    ports::{InstanceStoreError, InstanceStoreResult, WorkflowInstanceStore},
};

/// Thread-safe in-memory instance store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowInstanceStore {
    instances: Arc<RwLock<HashMap<WorkflowId, WorkflowInstance>>>,
}

impl InMemoryWorkflowInstanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored instances, open or closed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn len(&self) -> InstanceStoreResult<usize> {
        Ok(self.instances.read().map_err(poisoned)?.len())
    }

    /// Returns whether the store is empty.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn is_empty(&self) -> InstanceStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn with_running<T>(
        &self,
        id: &WorkflowId,
        edit: impl FnOnce(&mut WorkflowInstance) -> T,
    ) -> InstanceStoreResult<T> {
        let mut instances = self.instances.write().map_err(poisoned)?;
        let instance = instances
            .get_mut(id)
            .ok_or_else(|| InstanceStoreError::NotFound(id.clone()))?;
        if instance.status().is_closed() {
            return Err(InstanceStoreError::NotRunning(id.clone()));
        }
        Ok(edit(instance))
    }
}

fn poisoned(err: impl ToString) -> InstanceStoreError {
    InstanceStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkflowInstanceStore for InMemoryWorkflowInstanceStore {
    async fn insert(&self, instance: &WorkflowInstance) -> InstanceStoreResult<()> {
        let mut instances = self.instances.write().map_err(poisoned)?;
        let id = instance.workflow_id();
        if instances
            .get(id)
            .is_some_and(|existing| !existing.status().is_closed())
        {
            return Err(InstanceStoreError::AlreadyRunning(id.clone()));
        }
        instances.insert(id.clone(), instance.clone());
        Ok(())
    }

    async fn save_checkpoint(
        &self,
        id: &WorkflowId,
        state: &WorkflowState,
        consumed_signals: usize,
    ) -> InstanceStoreResult<()> {
        self.with_running(id, |instance| {
            instance.record_checkpoint(state.clone(), consumed_signals);
        })
    }

    async fn append_signal(
        &self,
        id: &WorkflowId,
        signal: WorkflowSignal,
    ) -> InstanceStoreResult<()> {
        self.with_running(id, |instance| instance.push_signal(signal))
    }

    async fn pending_signals(&self, id: &WorkflowId) -> InstanceStoreResult<Vec<WorkflowSignal>> {
        let instances = self.instances.read().map_err(poisoned)?;
        instances
            .get(id)
            .map(|instance| instance.pending_signals().to_vec())
            .ok_or_else(|| InstanceStoreError::NotFound(id.clone()))
    }

    async fn close(
        &self,
        id: &WorkflowId,
        closure: WorkflowClosure,
        closed_at: DateTime<Utc>,
    ) -> InstanceStoreResult<WorkflowInstance> {
        self.with_running(id, |instance| {
            instance.close(closure, closed_at);
            instance.clone()
        })
    }

    async fn find(&self, id: &WorkflowId) -> InstanceStoreResult<Option<WorkflowInstance>> {
        let instances = self.instances.read().map_err(poisoned)?;
        Ok(instances.get(id).cloned())
    }

    async fn list_running(&self) -> InstanceStoreResult<Vec<WorkflowInstance>> {
        let instances = self.instances.read().map_err(poisoned)?;
        let mut running: Vec<WorkflowInstance> = instances
            .values()
            .filter(|instance| !instance.status().is_closed())
            .cloned()
            .collect();
        running.sort_by_key(WorkflowInstance::start_time);
        Ok(running)
    }

    async fn purge_closed_before(&self, cutoff: DateTime<Utc>) -> InstanceStoreResult<u64> {
        let mut instances = self.instances.write().map_err(poisoned)?;
        let before = instances.len();
        instances.retain(|_, instance| {
            instance
                .close_time()
                .is_none_or(|closed_at| closed_at >= cutoff)
        });
        let removed = before.saturating_sub(instances.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
