//! Domain model for task records and user workflow boards.
//!
//! Task records are the documents workflows create, assign, relay and purge.
//! Boards summarise, per user, the effect of those operations. Neither type
//! knows about storage.

mod board;
mod error;
mod ids;
mod task;

pub use board::{ActiveWork, HandoffRecord, IncomingTask, UserBoard};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, UserId};
pub use task::{NewTask, Task, TaskPatch, TaskStatus};
