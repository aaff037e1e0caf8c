//! Activities: single retriable units of work against one collaborator.

mod contract;
mod deadline;
mod executor;

pub use contract::{ActivityFailure, ActivityResult, CleanupReport, TaskActivities};
pub use deadline::{APPROACHING_WINDOW, DeadlineCheck};
pub use executor::ActivityExecutor;
