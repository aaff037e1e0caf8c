//! In-memory task store for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    idempotency_index: HashMap<String, TaskId>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn len(&self) -> TaskStoreResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.len())
    }

    /// Returns whether the store holds no tasks.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the lock is poisoned.
    pub fn is_empty(&self) -> TaskStoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned(err: impl ToString) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn store(&self, task: &Task) -> TaskStoreResult<Task> {
        let mut state = self.state.write().map_err(poisoned)?;

        if let Some(existing) = task
            .idempotency_key()
            .and_then(|key| state.idempotency_index.get(key))
            .and_then(|id| state.tasks.get(id))
        {
            return Ok(existing.clone());
        }

        if state.tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }

        if let Some(key) = task.idempotency_key() {
            state.idempotency_index.insert(key.to_owned(), task.id());
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let slot = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskStoreError::NotFound(task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> TaskStoreResult<u64> {
        let mut state = self.state.write().map_err(poisoned)?;
        let expired: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_completed_before(cutoff))
            .cloned()
            .collect();

        for task in &expired {
            state.tasks.remove(&task.id());
            if let Some(key) = task.idempotency_key() {
                state.idempotency_index.remove(key);
            }
        }
        Ok(u64::try_from(expired.len()).unwrap_or(u64::MAX))
    }
}
