//! Signals delivered to running workflow instances.

use super::WorkflowError;
use crate::task::domain::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An asynchronous message that mutates a running instance's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum WorkflowSignal {
    /// The monitored task is done; the lifecycle loop exits at its next
    /// boundary.
    TaskCompleted,
    /// The monitored task now belongs to someone else.
    TaskReassigned {
        /// New assignee.
        new_user: UserId,
    },
}

#[derive(Deserialize)]
struct ReassignArgs {
    new_user: UserId,
}

impl WorkflowSignal {
    /// Wire name of [`WorkflowSignal::TaskCompleted`].
    pub const TASK_COMPLETED: &'static str = "task_completed";
    /// Wire name of [`WorkflowSignal::TaskReassigned`].
    pub const TASK_REASSIGNED: &'static str = "task_reassigned";

    /// Returns the wire name of the signal.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskCompleted => Self::TASK_COMPLETED,
            Self::TaskReassigned { .. } => Self::TASK_REASSIGNED,
        }
    }

    /// Decodes a signal from its name and optional JSON arguments.
    ///
    /// `task_reassigned` accepts either `{"new_user": "..."}` or a bare
    /// string.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownSignal`] for unrecognised names and
    /// [`WorkflowError::InvalidSignalArguments`] when arguments are missing or
    /// malformed.
    pub fn from_parts(name: &str, args: Option<Value>) -> Result<Self, WorkflowError> {
        match name.trim() {
            Self::TASK_COMPLETED => Ok(Self::TaskCompleted),
            Self::TASK_REASSIGNED => {
                let invalid = |reason: String| WorkflowError::InvalidSignalArguments {
                    signal: Self::TASK_REASSIGNED,
                    reason,
                };
                let new_user = match args {
                    Some(Value::String(raw)) => {
                        UserId::new(raw).map_err(|err| invalid(err.to_string()))?
                    }
                    Some(value) => serde_json::from_value::<ReassignArgs>(value)
                        .map_err(|err| invalid(err.to_string()))?
                        .new_user,
                    None => return Err(invalid("missing new_user".to_owned())),
                };
                Ok(Self::TaskReassigned { new_user })
            }
            _ => Err(WorkflowError::UnknownSignal(name.to_owned())),
        }
    }
}
