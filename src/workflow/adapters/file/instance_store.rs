//! JSON-file workflow instance store.
//!
//! The instance table is one JSON document inside a directory opened through
//! `cap-std`. Every write stages the full table in a sibling file and renames
//! it over the document, so a crash leaves either the old or the new table on
//! disk. Reopening the directory restores every instance, pending signals
//! included.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::workflow::{
    domain::{WorkflowClosure, WorkflowId, WorkflowInstance, WorkflowSignal, WorkflowState},
    ports::{InstanceStoreError, InstanceStoreResult, WorkflowInstanceStore},
};

/// File holding the instance table.
pub const TABLE_FILE: &str = "workflow-instances.json";
const STAGING_FILE: &str = "workflow-instances.json.staging";

type InstanceTable = BTreeMap<WorkflowId, WorkflowInstance>;

/// Instance store persisted as a JSON document in a directory.
///
/// Clones share the same table and directory handle.
#[derive(Debug, Clone)]
pub struct FileWorkflowInstanceStore {
    dir: Arc<Dir>,
    table: Arc<Mutex<InstanceTable>>,
}

impl FileWorkflowInstanceStore {
    /// Opens the store rooted at `root`, creating the directory when missing
    /// and loading any table a previous process left there.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the directory cannot be opened or the
    /// table on disk is unreadable.
    pub async fn open(root: &Utf8Path) -> InstanceStoreResult<Self> {
        let root_path = root.to_owned();
        let (dir, table) = run_blocking(move || {
            Dir::create_ambient_dir_all(&root_path, ambient_authority())
                .map_err(InstanceStoreError::persistence)?;
            let opened = Dir::open_ambient_dir(&root_path, ambient_authority())
                .map_err(InstanceStoreError::persistence)?;
            let loaded = read_table(&opened)?;
            Ok((opened, loaded))
        })
        .await?;
        tracing::info!(root = %root, instances = table.len(), "instance store opened");
        Ok(Self {
            dir: Arc::new(dir),
            table: Arc::new(Mutex::new(table)),
        })
    }

    /// Applies `edit` to a copy of the table, writes the copy to disk and
    /// only then makes it current.
    async fn commit<T>(
        &self,
        edit: impl FnOnce(&mut InstanceTable) -> InstanceStoreResult<T> + Send,
    ) -> InstanceStoreResult<T> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let outcome = edit(&mut next)?;
        let document = serde_json::to_vec_pretty(&next.values().collect::<Vec<_>>())
            .map_err(InstanceStoreError::persistence)?;
        let dir = Arc::clone(&self.dir);
        run_blocking(move || write_table(&dir, &document)).await?;
        *table = next;
        Ok(outcome)
    }
}

fn read_table(dir: &Dir) -> InstanceStoreResult<InstanceTable> {
    let text = match dir.read_to_string(TABLE_FILE) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(InstanceTable::new()),
        Err(err) => return Err(InstanceStoreError::persistence(err)),
    };
    let instances: Vec<WorkflowInstance> =
        serde_json::from_str(&text).map_err(InstanceStoreError::persistence)?;
    Ok(instances
        .into_iter()
        .map(|instance| (instance.workflow_id().clone(), instance))
        .collect())
}

fn write_table(dir: &Dir, document: &[u8]) -> InstanceStoreResult<()> {
    dir.write(STAGING_FILE, document)
        .and_then(|()| dir.rename(STAGING_FILE, dir, TABLE_FILE))
        .map_err(InstanceStoreError::persistence)
}

async fn run_blocking<F, T>(work: F) -> InstanceStoreResult<T>
where
    F: FnOnce() -> InstanceStoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(InstanceStoreError::persistence)?
}

fn running_mut<'table>(
    table: &'table mut InstanceTable,
    id: &WorkflowId,
) -> InstanceStoreResult<&'table mut WorkflowInstance> {
    let instance = table
        .get_mut(id)
        .ok_or_else(|| InstanceStoreError::NotFound(id.clone()))?;
    if instance.status().is_closed() {
        return Err(InstanceStoreError::NotRunning(id.clone()));
    }
    Ok(instance)
}

#[async_trait]
impl WorkflowInstanceStore for FileWorkflowInstanceStore {
    async fn insert(&self, instance: &WorkflowInstance) -> InstanceStoreResult<()> {
        self.commit(|table| {
            let id = instance.workflow_id();
            if table
                .get(id)
                .is_some_and(|existing| !existing.status().is_closed())
            {
                return Err(InstanceStoreError::AlreadyRunning(id.clone()));
            }
            table.insert(id.clone(), instance.clone());
            Ok(())
        })
        .await
    }

    async fn save_checkpoint(
        &self,
        id: &WorkflowId,
        state: &WorkflowState,
        consumed_signals: usize,
    ) -> InstanceStoreResult<()> {
        self.commit(|table| {
            running_mut(table, id)?.record_checkpoint(state.clone(), consumed_signals);
            Ok(())
        })
        .await
    }

    async fn append_signal(
        &self,
        id: &WorkflowId,
        signal: WorkflowSignal,
    ) -> InstanceStoreResult<()> {
        self.commit(|table| {
            running_mut(table, id)?.push_signal(signal);
            Ok(())
        })
        .await
    }

    async fn pending_signals(&self, id: &WorkflowId) -> InstanceStoreResult<Vec<WorkflowSignal>> {
        self.table
            .lock()
            .await
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
        self.commit(|table| {
            let instance = running_mut(table, id)?;
            instance.close(closure, closed_at);
            Ok(instance.clone())
        })
        .await
    }

    async fn find(&self, id: &WorkflowId) -> InstanceStoreResult<Option<WorkflowInstance>> {
        Ok(self.table.lock().await.get(id).cloned())
    }

    async fn list_running(&self) -> InstanceStoreResult<Vec<WorkflowInstance>> {
        let table = self.table.lock().await;
        let mut running: Vec<WorkflowInstance> = table
            .values()
            .filter(|instance| !instance.status().is_closed())
            .cloned()
            .collect();
        running.sort_by_key(WorkflowInstance::start_time);
        Ok(running)
    }

    async fn purge_closed_before(&self, cutoff: DateTime<Utc>) -> InstanceStoreResult<u64> {
        self.commit(|table| {
            let before = table.len();
            table.retain(|_, instance| {
                instance
                    .close_time()
                    .is_none_or(|closed_at| closed_at >= cutoff)
            });
            let removed = before.saturating_sub(table.len());
            Ok(u64::try_from(removed).unwrap_or(u64::MAX))
        })
        .await
    }
}
