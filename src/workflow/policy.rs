//! Declarative retry and timeout policy for activities.
//!
//! Every activity call site looks its options up by [`ActivityKind`] instead
//! of carrying its own timeout and retry settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Identifies an activity for policy lookup and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Insert a task record.
    CreateTask,
    /// Patch a task record.
    UpdateTask,
    /// Assign a task and update the assignee's board.
    AssignTask,
    /// Relay a task and update both boards.
    RelayTask,
    /// Hand a notification to the sink.
    SendNotification,
    /// Evaluate a task's estimated handoff.
    CheckTaskDeadline,
    /// Purge old completed tasks.
    CleanupCompletedTasks,
}

impl ActivityKind {
    /// Every activity kind.
    pub const ALL: [Self; 7] = [
        Self::CreateTask,
        Self::UpdateTask,
        Self::AssignTask,
        Self::RelayTask,
        Self::SendNotification,
        Self::CheckTaskDeadline,
        Self::CleanupCompletedTasks,
    ];

    /// Returns the activity name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::UpdateTask => "update_task",
            Self::AssignTask => "assign_task",
            Self::RelayTask => "relay_task",
            Self::SendNotification => "send_notification",
            Self::CheckTaskDeadline => "check_task_deadline",
            Self::CleanupCompletedTasks => "cleanup_completed_tasks",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded re-execution with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_interval: Duration,
    /// Growth factor applied to each subsequent delay.
    pub backoff_coefficient: u32,
    /// Upper bound on any single delay.
    pub maximum_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2,
            maximum_interval: Duration::from_secs(100),
        }
    }
}

impl RetryPolicy {
    /// Returns the policy with a different attempt bound.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Returns whether another attempt follows attempt number `attempt`
    /// (1-based).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self
            .backoff_coefficient
            .checked_pow(exponent)
            .unwrap_or(u32::MAX);
        self.initial_interval
            .saturating_mul(factor)
            .min(self.maximum_interval)
    }
}

/// Timeout and retry settings for one activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityOptions {
    /// Limit on a single attempt.
    pub start_to_close_timeout: Duration,
    /// Re-execution policy.
    pub retry: RetryPolicy,
}

impl ActivityOptions {
    /// Built-in options for `kind`.
    #[must_use]
    pub fn default_for(kind: ActivityKind) -> Self {
        let retry = RetryPolicy::default();
        match kind {
            ActivityKind::CreateTask
            | ActivityKind::UpdateTask
            | ActivityKind::AssignTask
            | ActivityKind::RelayTask
            | ActivityKind::CheckTaskDeadline => Self {
                start_to_close_timeout: Duration::from_secs(30),
                retry,
            },
            ActivityKind::SendNotification => Self {
                start_to_close_timeout: Duration::from_secs(10),
                retry,
            },
            ActivityKind::CleanupCompletedTasks => Self {
                start_to_close_timeout: Duration::from_secs(5 * 60),
                retry: retry.with_max_attempts(2),
            },
        }
    }
}

/// Policy table keyed by activity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPolicies {
    table: HashMap<ActivityKind, ActivityOptions>,
}

impl Default for ActivityPolicies {
    fn default() -> Self {
        let table = ActivityKind::ALL
            .into_iter()
            .map(|kind| (kind, ActivityOptions::default_for(kind)))
            .collect();
        Self { table }
    }
}

impl ActivityPolicies {
    /// Replaces the options for one activity kind.
    #[must_use]
    pub fn with_policy(mut self, kind: ActivityKind, options: ActivityOptions) -> Self {
        self.table.insert(kind, options);
        self
    }

    /// Returns the options for `kind`.
    #[must_use]
    pub fn options_for(&self, kind: ActivityKind) -> ActivityOptions {
        self.table
            .get(&kind)
            .copied()
            .unwrap_or_else(|| ActivityOptions::default_for(kind))
    }
}
