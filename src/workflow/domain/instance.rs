//! Workflow instance record, run outputs and the status view.

use super::{WorkflowId, WorkflowInput, WorkflowSignal, WorkflowState, WorkflowStatus, WorkflowType};
use crate::task::domain::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value returned by a workflow's run method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Whether the workflow achieved its goal.
    pub success: bool,
    /// Task the run worked on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// User the run worked for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Task created during onboarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_task_id: Option<TaskId>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowOutput {
    /// A successful output with no payload.
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A failed output carrying `error`.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Attaches the task the run worked on.
    #[must_use]
    pub const fn with_task_id(mut self, task_id: Option<TaskId>) -> Self {
        self.task_id = task_id;
        self
    }

    /// Attaches the user the run worked for.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attaches the onboarding task.
    #[must_use]
    pub const fn with_onboarding_task_id(mut self, task_id: Option<TaskId>) -> Self {
        self.onboarding_task_id = task_id;
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowClosure {
    /// The run returned `success = true`.
    Completed(WorkflowOutput),
    /// The run returned `success = false` or faulted.
    Failed {
        /// Output, when the run returned one.
        result: Option<WorkflowOutput>,
        /// Human-readable reason.
        error: String,
    },
    /// The execution timeout elapsed.
    TimedOut,
}

impl WorkflowClosure {
    /// Maps a returned output to its closure.
    #[must_use]
    pub fn from_output(output: WorkflowOutput) -> Self {
        if output.success {
            return Self::Completed(output);
        }
        let error = output
            .error
            .clone()
            .unwrap_or_else(|| "workflow reported failure".to_owned());
        Self::Failed {
            result: Some(output),
            error,
        }
    }

    /// A fault raised by the run itself.
    #[must_use]
    pub fn fault(error: impl Into<String>) -> Self {
        Self::Failed {
            result: None,
            error: error.into(),
        }
    }

    /// Terminal status for this closure.
    #[must_use]
    pub const fn status(&self) -> WorkflowStatus {
        match self {
            Self::Completed(_) => WorkflowStatus::Completed,
            Self::Failed { .. } => WorkflowStatus::Failed,
            Self::TimedOut => WorkflowStatus::TimedOut,
        }
    }
}

/// Point-in-time status of a workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDescription {
    /// Instance identifier.
    pub workflow_id: WorkflowId,
    /// Workflow type.
    pub workflow_type: WorkflowType,
    /// Current status.
    pub status: WorkflowStatus,
    /// Task queue the instance runs on.
    pub task_queue: String,
    /// When the run started.
    pub start_time: DateTime<Utc>,
    /// When the run closed.
    pub close_time: Option<DateTime<Utc>>,
    /// Returned output, if any.
    pub result: Option<WorkflowOutput>,
    /// Failure reason, if any.
    pub error: Option<String>,
}

/// Durable record of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    workflow_id: WorkflowId,
    workflow_type: WorkflowType,
    task_queue: String,
    status: WorkflowStatus,
    start_time: DateTime<Utc>,
    close_time: Option<DateTime<Utc>>,
    input: WorkflowInput,
    state: WorkflowState,
    pending_signals: Vec<WorkflowSignal>,
    result: Option<WorkflowOutput>,
    error: Option<String>,
}

impl WorkflowInstance {
    /// Creates a running instance with the initial state for its input.
    #[must_use]
    pub fn start(
        workflow_id: WorkflowId,
        input: WorkflowInput,
        task_queue: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        let workflow_type = input.workflow_type();
        Self {
            workflow_id,
            workflow_type,
            task_queue: task_queue.into(),
            status: WorkflowStatus::Running,
            start_time,
            close_time: None,
            input,
            state: WorkflowState::initial(workflow_type),
            pending_signals: Vec::new(),
            result: None,
            error: None,
        }
    }

    /// Returns the instance identifier.
    #[must_use]
    pub const fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    /// Returns the workflow type.
    #[must_use]
    pub const fn workflow_type(&self) -> WorkflowType {
        self.workflow_type
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Returns when the run started.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns when the run closed.
    #[must_use]
    pub const fn close_time(&self) -> Option<DateTime<Utc>> {
        self.close_time
    }

    /// Returns the start input.
    #[must_use]
    pub const fn input(&self) -> &WorkflowInput {
        &self.input
    }

    /// Returns the last checkpointed state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Returns signals delivered but not yet consumed.
    #[must_use]
    pub fn pending_signals(&self) -> &[WorkflowSignal] {
        &self.pending_signals
    }

    /// Returns the recorded output.
    #[must_use]
    pub const fn result(&self) -> Option<&WorkflowOutput> {
        self.result.as_ref()
    }

    /// Instant at which the execution timeout elapses.
    #[must_use]
    pub fn execution_deadline(&self) -> DateTime<Utc> {
        self.start_time + self.workflow_type.execution_timeout()
    }

    /// Replaces the state and drops the first `consumed` pending signals.
    pub fn record_checkpoint(&mut self, state: WorkflowState, consumed: usize) {
        self.state = state;
        let drained = consumed.min(self.pending_signals.len());
        self.pending_signals.drain(..drained);
    }

    /// Appends a signal to the inbox.
    pub fn push_signal(&mut self, signal: WorkflowSignal) {
        self.pending_signals.push(signal);
    }

    /// Moves the instance to its terminal status.
    pub fn close(&mut self, closure: WorkflowClosure, closed_at: DateTime<Utc>) {
        self.status = closure.status();
        self.close_time = Some(closed_at);
        self.pending_signals.clear();
        match closure {
            WorkflowClosure::Completed(output) => self.result = Some(output),
            WorkflowClosure::Failed { result, error } => {
                self.result = result;
                self.error = Some(error);
            }
            WorkflowClosure::TimedOut => {
                self.error = Some(format!(
                    "execution timeout of {}s elapsed",
                    self.workflow_type.execution_timeout().num_seconds()
                ));
            }
        }
    }

    /// Returns the status view.
    #[must_use]
    pub fn describe(&self) -> WorkflowDescription {
        WorkflowDescription {
            workflow_id: self.workflow_id.clone(),
            workflow_type: self.workflow_type,
            status: self.status,
            task_queue: self.task_queue.clone(),
            start_time: self.start_time,
            close_time: self.close_time,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}
