//! Workflow types and run status.

use super::{WorkflowError, WorkflowSignal};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of process shapes the runtime can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowType {
    /// Create, optionally assign, then monitor a task until completion.
    #[serde(rename = "TaskLifecycleWorkflow")]
    TaskLifecycle,
    /// Hand a task from one user to another.
    #[serde(rename = "TaskRelayWorkflow")]
    TaskRelay,
    /// Greet a new user and give them a first task.
    #[serde(rename = "UserOnboardingWorkflow")]
    UserOnboarding,
    /// Purge old completed tasks forever.
    #[serde(rename = "PeriodicCleanupWorkflow")]
    PeriodicCleanup,
}

impl WorkflowType {
    /// Returns the registered workflow name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskLifecycle => "TaskLifecycleWorkflow",
            Self::TaskRelay => "TaskRelayWorkflow",
            Self::UserOnboarding => "UserOnboardingWorkflow",
            Self::PeriodicCleanup => "PeriodicCleanupWorkflow",
        }
    }

    /// Returns the prefix used when deriving instance identifiers.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::TaskLifecycle => "task-lifecycle",
            Self::TaskRelay => "task-relay",
            Self::UserOnboarding => "user-onboarding",
            Self::PeriodicCleanup => "periodic-cleanup",
        }
    }

    /// Maximum wall time an instance may run, measured from its start.
    #[must_use]
    pub const fn execution_timeout(self) -> TimeDelta {
        match self {
            Self::TaskLifecycle => TimeDelta::days(30),
            Self::TaskRelay => TimeDelta::minutes(10),
            Self::UserOnboarding => TimeDelta::days(7),
            Self::PeriodicCleanup => TimeDelta::days(365),
        }
    }

    /// Returns whether instances of this type handle `signal`.
    #[must_use]
    pub const fn accepts(self, signal: &WorkflowSignal) -> bool {
        match signal {
            WorkflowSignal::TaskCompleted | WorkflowSignal::TaskReassigned { .. } => {
                matches!(self, Self::TaskLifecycle)
            }
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkflowType {
    type Error = WorkflowError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let bare = trimmed.strip_suffix("Workflow").unwrap_or(trimmed);
        match bare {
            "TaskLifecycle" => Ok(Self::TaskLifecycle),
            "TaskRelay" => Ok(Self::TaskRelay),
            "UserOnboarding" => Ok(Self::UserOnboarding),
            "PeriodicCleanup" => Ok(Self::PeriodicCleanup),
            _ => Err(WorkflowError::UnknownWorkflowType(value.to_owned())),
        }
    }
}

/// Execution status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// The instance is executing or waiting on a timer.
    Running,
    /// The run method returned a successful result.
    Completed,
    /// The run method reported failure or faulted.
    Failed,
    /// The execution timeout elapsed first.
    TimedOut,
}

impl WorkflowStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    /// Returns whether the instance has reached a terminal status.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
