//! Checkpointable per-workflow state.
//!
//! Every field a definition needs to resume after a restart lives here,
//! including the wake-up instant of a pending timer.

use super::{WorkflowSignal, WorkflowType};
use crate::task::domain::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of a task lifecycle run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    /// The task record has not been created yet.
    #[default]
    Creating,
    /// The task exists; the optional assignment is pending.
    Assigning,
    /// Hourly deadline checks until the completion signal arrives.
    Monitoring,
    /// The completion signal was observed.
    Finished,
}

/// State of a task lifecycle run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLifecycleState {
    /// Current stage.
    pub stage: LifecycleStage,
    /// Task created by the first step.
    pub task_id: Option<TaskId>,
    /// User receiving deadline notifications.
    pub assigned_user: Option<UserId>,
    /// Set once by the completion signal.
    pub is_completed: bool,
    /// Wake-up instant of the pending monitoring timer.
    pub wake_at: Option<DateTime<Utc>>,
    /// Deadline checks performed so far.
    pub deadline_checks: u64,
}

impl TaskLifecycleState {
    /// Applies a signal to the state.
    ///
    /// Completion is sticky; reassignment only replaces the assignee.
    pub fn apply(&mut self, signal: &WorkflowSignal) {
        match signal {
            WorkflowSignal::TaskCompleted => {
                if !self.is_completed {
                    tracing::info!(task_id = ?self.task_id, "task marked as completed");
                }
                self.is_completed = true;
            }
            WorkflowSignal::TaskReassigned { new_user } => {
                tracing::info!(
                    task_id = ?self.task_id,
                    from = ?self.assigned_user,
                    to = %new_user,
                    "task reassigned"
                );
                self.assigned_user = Some(new_user.clone());
            }
        }
    }
}

/// Progress of a task relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayStage {
    /// The relay activity has not succeeded yet.
    #[default]
    Relaying,
    /// The relay succeeded; both parties still need to hear about it.
    Notifying,
    /// Both notifications were attempted.
    Finished,
}

/// State of a task relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelayState {
    /// Current stage.
    pub stage: RelayStage,
}

/// Progress of a user onboarding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    /// The welcome message is pending.
    #[default]
    Welcoming,
    /// The profile task is being created.
    CreatingTask,
    /// Waiting a day before the reminder.
    AwaitingReminder,
    /// The reminder was sent.
    Finished,
}

/// State of a user onboarding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOnboardingState {
    /// Current stage.
    pub stage: OnboardingStage,
    /// Profile task, once created.
    pub onboarding_task_id: Option<TaskId>,
    /// Wake-up instant of the reminder timer.
    pub wake_at: Option<DateTime<Utc>>,
}

/// State of the cleanup singleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicCleanupState {
    /// Wake-up instant of the next pass.
    pub wake_at: Option<DateTime<Utc>>,
    /// Passes attempted so far.
    pub passes: u64,
    /// Tasks removed by the last successful pass.
    pub last_cleaned: Option<u64>,
}

/// Checkpointed state of any workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow_type", content = "state")]
pub enum WorkflowState {
    /// Lifecycle state.
    TaskLifecycle(TaskLifecycleState),
    /// Relay state.
    TaskRelay(TaskRelayState),
    /// Onboarding state.
    UserOnboarding(UserOnboardingState),
    /// Cleanup state.
    PeriodicCleanup(PeriodicCleanupState),
}

impl WorkflowState {
    /// Returns the state a fresh run of `workflow_type` starts from.
    #[must_use]
    pub fn initial(workflow_type: WorkflowType) -> Self {
        match workflow_type {
            WorkflowType::TaskLifecycle => Self::TaskLifecycle(TaskLifecycleState::default()),
            WorkflowType::TaskRelay => Self::TaskRelay(TaskRelayState::default()),
            WorkflowType::UserOnboarding => Self::UserOnboarding(UserOnboardingState::default()),
            WorkflowType::PeriodicCleanup => {
                Self::PeriodicCleanup(PeriodicCleanupState::default())
            }
        }
    }

    /// Returns the workflow type owning this state.
    #[must_use]
    pub const fn workflow_type(&self) -> WorkflowType {
        match self {
            Self::TaskLifecycle(_) => WorkflowType::TaskLifecycle,
            Self::TaskRelay(_) => WorkflowType::TaskRelay,
            Self::UserOnboarding(_) => WorkflowType::UserOnboarding,
            Self::PeriodicCleanup(_) => WorkflowType::PeriodicCleanup,
        }
    }
}

impl From<TaskLifecycleState> for WorkflowState {
    fn from(value: TaskLifecycleState) -> Self {
        Self::TaskLifecycle(value)
    }
}

impl From<TaskRelayState> for WorkflowState {
    fn from(value: TaskRelayState) -> Self {
        Self::TaskRelay(value)
    }
}

impl From<UserOnboardingState> for WorkflowState {
    fn from(value: UserOnboardingState) -> Self {
        Self::UserOnboarding(value)
    }
}

impl From<PeriodicCleanupState> for WorkflowState {
    fn from(value: PeriodicCleanupState) -> Self {
        Self::PeriodicCleanup(value)
    }
}
