//! In-memory adapters for task records and user boards.

mod board;
mod task;

pub use board::InMemoryWorkflowBoard;
pub use task::InMemoryTaskStore;
