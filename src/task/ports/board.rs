//! Port for the per-user workflow board.

use crate::task::domain::{ActiveWork, HandoffRecord, IncomingTask, UserBoard, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for board operations.
pub type WorkflowBoardResult<T> = Result<T, WorkflowBoardError>;

/// Board persistence contract.
///
/// Each write is committed on its own; callers must not assume any write
/// is atomic with a task store write.
#[async_trait]
pub trait WorkflowBoard: Send + Sync {
    /// Replaces the user's current work.
    async fn record_active_work(&self, user: &UserId, work: ActiveWork)
    -> WorkflowBoardResult<()>;

    /// Appends a handoff to the sender's board.
    async fn record_handoff(&self, user: &UserId, handoff: HandoffRecord)
    -> WorkflowBoardResult<()>;

    /// Appends an incoming relay to the receiver's board.
    async fn record_incoming(&self, user: &UserId, incoming: IncomingTask)
    -> WorkflowBoardResult<()>;

    /// Returns the user's board; unknown users have an empty board.
    async fn board_for(&self, user: &UserId) -> WorkflowBoardResult<UserBoard>;
}

/// Errors returned by board implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowBoardError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowBoardError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
