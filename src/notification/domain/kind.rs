//! Closed set of notification categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a notification, used by delivery channels for templating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Generic informational message.
    #[default]
    Info,
    /// A task was assigned to the recipient.
    TaskAssignment,
    /// An assigned task's deadline is within a day.
    DeadlineWarning,
    /// An assigned task's deadline has passed.
    DeadlineOverdue,
    /// Someone relayed a task to the recipient.
    TaskRelayReceived,
    /// The recipient's relay went through.
    TaskRelaySent,
    /// Greeting for a new user.
    Welcome,
    /// An onboarding task was created for the recipient.
    OnboardingTask,
    /// Follow-up nudge a day after onboarding.
    OnboardingReminder,
}

impl NotificationKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::TaskAssignment => "task_assignment",
            Self::DeadlineWarning => "deadline_warning",
            Self::DeadlineOverdue => "deadline_overdue",
            Self::TaskRelayReceived => "task_relay_received",
            Self::TaskRelaySent => "task_relay_sent",
            Self::Welcome => "welcome",
            Self::OnboardingTask => "onboarding_task",
            Self::OnboardingReminder => "onboarding_reminder",
        }
    }

    const ALL: [Self; 9] = [
        Self::Info,
        Self::TaskAssignment,
        Self::DeadlineWarning,
        Self::DeadlineOverdue,
        Self::TaskRelayReceived,
        Self::TaskRelaySent,
        Self::Welcome,
        Self::OnboardingTask,
        Self::OnboardingReminder,
    ];
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a notification kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown notification kind: {0}")]
pub struct ParseNotificationKindError(pub String);

impl TryFrom<&str> for NotificationKind {
    type Error = ParseNotificationKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalised = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalised)
            .ok_or_else(|| ParseNotificationKindError(value.to_owned()))
    }
}
