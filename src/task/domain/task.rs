//! Task record aggregate and the request values used to create and edit it.

use super::{ParseTaskStatusError, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task status as tracked by the document store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is the holder's current work.
    #[default]
    Active,
    /// Task is queued for its holder.
    Waiting,
    /// Task has been finished.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "waiting" => Ok(Self::Waiting),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Payload describing a task to create.
///
/// The serialised form uses the camel-case field names of the HTTP layer
/// (`assignedTo`, `estimatedHandoff`, `idempotencyKey`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    progress: u8,
    #[serde(default)]
    assigned_to: Option<UserId>,
    #[serde(default)]
    estimated_handoff: Option<String>,
    #[serde(default)]
    idempotency_key: Option<String>,
}

impl NewTask {
    /// Creates a task payload with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Active,
            progress: 0,
            assigned_to: None,
            estimated_handoff: None,
            idempotency_key: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the initial progress percentage.
    #[must_use]
    pub const fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the user the task should be assigned to.
    #[must_use]
    pub fn with_assignee(mut self, user: UserId) -> Self {
        self.assigned_to = Some(user);
        self
    }

    /// Sets the estimated handoff timestamp, expected in RFC 3339 form.
    #[must_use]
    pub fn with_estimated_handoff(mut self, estimated_handoff: impl Into<String>) -> Self {
        self.estimated_handoff = Some(estimated_handoff.into());
        self
    }

    /// Sets the client-supplied idempotency key used to deduplicate creates.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the requested assignee, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    /// Returns the idempotency key, if any.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

/// Partial update applied to an existing task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Replacement progress percentage.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Replacement estimated handoff timestamp.
    #[serde(default)]
    pub estimated_handoff: Option<String>,
}

impl TaskPatch {
    /// Returns a patch that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Task record aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    progress: u8,
    assigned_to: Option<UserId>,
    relayed_from: Option<UserId>,
    relayed_at: Option<DateTime<Utc>>,
    estimated_handoff: Option<String>,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task record from a creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title and
    /// [`TaskDomainError::InvalidProgress`] for progress above 100.
    pub fn create(draft: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = validated_title(&draft.title)?;
        let progress = validated_progress(draft.progress)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: draft.description,
            status: draft.status,
            progress,
            assigned_to: draft.assigned_to,
            relayed_from: None,
            relayed_at: None,
            estimated_handoff: draft.estimated_handoff,
            idempotency_key: draft.idempotency_key,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the progress percentage.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Returns the current assignee, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    /// Returns the user the task was last relayed from, if any.
    #[must_use]
    pub const fn relayed_from(&self) -> Option<&UserId> {
        self.relayed_from.as_ref()
    }

    /// Returns the time of the last relay, if any.
    #[must_use]
    pub const fn relayed_at(&self) -> Option<DateTime<Utc>> {
        self.relayed_at
    }

    /// Returns the raw estimated handoff value as stored.
    #[must_use]
    pub fn estimated_handoff(&self) -> Option<&str> {
        self.estimated_handoff.as_deref()
    }

    /// Returns the idempotency key the task was created with, if any.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Parses the estimated handoff into a UTC deadline.
    ///
    /// Returns `None` when no estimate is stored. RFC 3339 values are
    /// accepted, as are offset-less ISO 8601 values, which are read as UTC.
    /// A bare date means midnight UTC on that day.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the stored value is not a timestamp.
    pub fn deadline(&self) -> Option<Result<DateTime<Utc>, chrono::ParseError>> {
        self.estimated_handoff.as_deref().map(parse_deadline)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the patched title or progress is
    /// invalid; the task is left unchanged in that case.
    pub fn apply_patch(&mut self, patch: TaskPatch, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let title = patch.title.as_deref().map(validated_title).transpose()?;
        let progress = patch.progress.map(validated_progress).transpose()?;

        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = progress {
            self.progress = value;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(estimated_handoff) = patch.estimated_handoff {
            self.estimated_handoff = Some(estimated_handoff);
        }
        self.touch(clock);
        Ok(())
    }

    /// Assigns the task to a user.
    pub fn assign(&mut self, user: UserId, clock: &impl Clock) {
        self.assigned_to = Some(user);
        self.touch(clock);
    }

    /// Relays the task from one user to another.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RelayToSelf`] when both users are the same.
    pub fn relay(
        &mut self,
        from: UserId,
        to: UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if from == to {
            return Err(TaskDomainError::RelayToSelf(from.to_string()));
        }
        let timestamp = clock.utc();
        self.relayed_from = Some(from);
        self.assigned_to = Some(to);
        self.relayed_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    /// Returns whether the task is a completed record last touched before
    /// `cutoff`.
    #[must_use]
    pub fn is_completed_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Completed && self.updated_at < cutoff
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn validated_title(raw: &str) -> Result<String, TaskDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

const fn validated_progress(progress: u8) -> Result<u8, TaskDomainError> {
    if progress > 100 {
        return Err(TaskDomainError::InvalidProgress(progress));
    }
    Ok(progress)
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|parsed| parsed.with_timezone(&Utc))
        .or_else(|rfc_err| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .or_else(|_| {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                })
                .map_err(|_| rfc_err)
        })
}
