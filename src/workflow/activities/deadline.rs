//! Deadline evaluation for task monitoring.

use super::ActivityFailure;
use crate::task::domain::{Task, TaskId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Window before a deadline in which it counts as approaching.
pub const APPROACHING_WINDOW: TimeDelta = TimeDelta::hours(24);

/// Result of comparing a task's estimated handoff with the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineCheck {
    /// Task checked.
    pub task_id: TaskId,
    /// Whether the task has an estimated handoff.
    pub has_deadline: bool,
    /// Parsed deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// The deadline is in the future but within a day.
    pub is_approaching: bool,
    /// The deadline has passed.
    pub is_overdue: bool,
    /// Seconds until the deadline; negative once overdue.
    pub time_remaining_seconds: Option<i64>,
}

impl DeadlineCheck {
    /// Evaluates `task` at `now`.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`ActivityFailure`] when the estimated handoff is
    /// not a valid timestamp.
    pub fn evaluate(task: &Task, now: DateTime<Utc>) -> Result<Self, ActivityFailure> {
        let Some(parsed) = task.deadline() else {
            return Ok(Self::without_deadline(task.id()));
        };
        let deadline = parsed.map_err(|err| {
            ActivityFailure::permanent(format!("invalid deadline format: {err}"))
        })?;
        Ok(Self::at(task.id(), deadline, now))
    }

    /// A check for a task that has no estimated handoff.
    #[must_use]
    pub const fn without_deadline(task_id: TaskId) -> Self {
        Self {
            task_id,
            has_deadline: false,
            deadline: None,
            is_approaching: false,
            is_overdue: false,
            time_remaining_seconds: None,
        }
    }

    /// A check of `deadline` at `now`.
    #[must_use]
    pub fn at(task_id: TaskId, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = deadline - now;
        Self {
            task_id,
            has_deadline: true,
            deadline: Some(deadline),
            is_approaching: remaining > TimeDelta::zero() && remaining <= APPROACHING_WINDOW,
            is_overdue: remaining <= TimeDelta::zero(),
            time_remaining_seconds: Some(remaining.num_seconds()),
        }
    }
}
