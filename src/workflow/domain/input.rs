//! Typed start inputs for each workflow type.

use super::{WorkflowError, WorkflowType};
use crate::task::domain::{NewTask, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input of a task relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelayInput {
    /// Task being handed over.
    pub task_id: TaskId,
    /// Current owner.
    pub from_user: UserId,
    /// New owner.
    pub to_user: UserId,
    /// Optional note for the receiver.
    #[serde(default)]
    pub message: Option<String>,
}

/// Input of a user onboarding run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOnboardingInput {
    /// The new user.
    pub user_id: UserId,
    /// Display name, if known.
    #[serde(default)]
    pub name: Option<String>,
    /// When the account was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserOnboardingInput {
    /// Creates an onboarding input for `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            created_at: None,
        }
    }
}

/// Input of the cleanup singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCleanupInput")]
pub struct PeriodicCleanupInput {
    cleanup_interval_days: u32,
}

#[derive(Deserialize)]
struct RawCleanupInput {
    #[serde(default = "default_interval_days")]
    cleanup_interval_days: u32,
}

const fn default_interval_days() -> u32 {
    1
}

/// Longest accepted cleanup interval; matches the singleton's one-year
/// execution timeout.
pub const MAX_CLEANUP_INTERVAL_DAYS: u32 = 365;

impl PeriodicCleanupInput {
    /// Creates a cleanup input.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidCleanupInterval`] for zero days or more
    /// than [`MAX_CLEANUP_INTERVAL_DAYS`].
    pub const fn new(cleanup_interval_days: u32) -> Result<Self, WorkflowError> {
        if cleanup_interval_days == 0 || cleanup_interval_days > MAX_CLEANUP_INTERVAL_DAYS {
            return Err(WorkflowError::InvalidCleanupInterval {
                days: cleanup_interval_days,
                max: MAX_CLEANUP_INTERVAL_DAYS,
            });
        }
        Ok(Self {
            cleanup_interval_days,
        })
    }

    /// Days between cleanup passes.
    #[must_use]
    pub const fn cleanup_interval_days(self) -> u32 {
        self.cleanup_interval_days
    }
}

impl Default for PeriodicCleanupInput {
    fn default() -> Self {
        Self {
            cleanup_interval_days: default_interval_days(),
        }
    }
}

impl TryFrom<RawCleanupInput> for PeriodicCleanupInput {
    type Error = WorkflowError;

    fn try_from(raw: RawCleanupInput) -> Result<Self, Self::Error> {
        Self::new(raw.cleanup_interval_days)
    }
}

/// Start input of any workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow_type", content = "input")]
pub enum WorkflowInput {
    /// Task data for a lifecycle run, in the HTTP layer's camelCase shape.
    TaskLifecycle(NewTask),
    /// Relay request.
    TaskRelay(TaskRelayInput),
    /// New user.
    UserOnboarding(UserOnboardingInput),
    /// Cleanup cadence.
    PeriodicCleanup(PeriodicCleanupInput),
}

impl WorkflowInput {
    /// Returns the workflow type this input starts.
    #[must_use]
    pub const fn workflow_type(&self) -> WorkflowType {
        match self {
            Self::TaskLifecycle(_) => WorkflowType::TaskLifecycle,
            Self::TaskRelay(_) => WorkflowType::TaskRelay,
            Self::UserOnboarding(_) => WorkflowType::UserOnboarding,
            Self::PeriodicCleanup(_) => WorkflowType::PeriodicCleanup,
        }
    }

    /// Decodes an untyped JSON payload for `workflow_type`.
    ///
    /// A `null` payload is accepted for the cleanup singleton and yields the
    /// default interval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidInput`] when the payload does not match
    /// the workflow's input shape.
    pub fn from_json(workflow_type: WorkflowType, payload: Value) -> Result<Self, WorkflowError> {
        let invalid = |err: serde_json::Error| WorkflowError::InvalidInput {
            workflow_type,
            reason: err.to_string(),
        };
        match workflow_type {
            WorkflowType::TaskLifecycle => serde_json::from_value(payload)
                .map(Self::TaskLifecycle)
                .map_err(invalid),
            WorkflowType::TaskRelay => serde_json::from_value(payload)
                .map(Self::TaskRelay)
                .map_err(invalid),
            WorkflowType::UserOnboarding => serde_json::from_value(payload)
                .map(Self::UserOnboarding)
                .map_err(invalid),
            WorkflowType::PeriodicCleanup if payload.is_null() => {
                Ok(Self::PeriodicCleanup(PeriodicCleanupInput::default()))
            }
            WorkflowType::PeriodicCleanup => serde_json::from_value(payload)
                .map(Self::PeriodicCleanup)
                .map_err(invalid),
        }
    }
}
