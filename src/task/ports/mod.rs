//! Port contracts for task records and user boards.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod board;
pub mod repository;

pub use board::{WorkflowBoard, WorkflowBoardError, WorkflowBoardResult};
pub use repository::{TaskStore, TaskStoreError, TaskStoreResult};
