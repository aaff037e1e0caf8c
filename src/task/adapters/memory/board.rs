//! In-memory workflow board.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ActiveWork, HandoffRecord, IncomingTask, UserBoard, UserId},
    ports::{WorkflowBoard, WorkflowBoardError, WorkflowBoardResult},
};

/// Thread-safe in-memory board keyed by user.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowBoard {
    boards: Arc<RwLock<HashMap<UserId, UserBoard>>>,
}

impl InMemoryWorkflowBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_board(
        &self,
        user: &UserId,
        edit: impl FnOnce(&mut UserBoard),
    ) -> WorkflowBoardResult<()> {
        let mut boards = self.boards.write().map_err(|err| {
            WorkflowBoardError::persistence(std::io::Error::other(err.to_string()))
        })?;
        edit(boards.entry(user.clone()).or_default());
        Ok(())
    }
}

#[async_trait]
impl WorkflowBoard for InMemoryWorkflowBoard {
    async fn record_active_work(
        &self,
        user: &UserId,
        work: ActiveWork,
    ) -> WorkflowBoardResult<()> {
        self.with_board(user, |board| board.active_work = Some(work))
    }

    async fn record_handoff(
        &self,
        user: &UserId,
        handoff: HandoffRecord,
    ) -> WorkflowBoardResult<()> {
        self.with_board(user, |board| board.handoffs.insert(0, handoff))
    }

    async fn record_incoming(
        &self,
        user: &UserId,
        incoming: IncomingTask,
    ) -> WorkflowBoardResult<()> {
        self.with_board(user, |board| board.incoming.insert(0, incoming))
    }

    async fn board_for(&self, user: &UserId) -> WorkflowBoardResult<UserBoard> {
        let boards = self.boards.read().map_err(|err| {
            WorkflowBoardError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(boards.get(user).cloned().unwrap_or_default())
    }
}
