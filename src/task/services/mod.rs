//! Application services for task record management.

mod records;

pub use records::{
    PurgeSummary, RelayTaskRequest, TaskRecordService, TaskServiceError, TaskServiceResult,
};
