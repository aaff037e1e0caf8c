//! Error types for workflow domain values and execution.

use super::WorkflowType;
use chrono::TimeDelta;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building workflow values or running a definition.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// The workflow identifier was blank.
    #[error("workflow identifier must not be empty")]
    EmptyWorkflowId,

    /// The workflow type name is not recognised.
    #[error("unknown workflow type: {0}")]
    UnknownWorkflowType(String),

    /// The signal name is not recognised.
    #[error("unknown signal: {0}")]
    UnknownSignal(String),

    /// The signal arguments could not be decoded.
    #[error("invalid arguments for signal {signal}: {reason}")]
    InvalidSignalArguments {
        /// Signal name.
        signal: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The start input could not be decoded for the workflow type.
    #[error("invalid input for {workflow_type}: {reason}")]
    InvalidInput {
        /// Workflow type being started.
        workflow_type: WorkflowType,
        /// Decoder or validation message.
        reason: String,
    },

    /// Cleanup intervals are whole days within the singleton's execution
    /// timeout.
    #[error("cleanup interval must be between 1 and {max} days, got {days}")]
    InvalidCleanupInterval {
        /// Requested interval.
        days: u32,
        /// Largest accepted interval.
        max: u32,
    },

    /// A timer would wake beyond the representable range of instants.
    #[error("timer of {0} overflows the clock")]
    TimerOverflow(TimeDelta),

    /// The persisted state does not belong to the workflow being resumed.
    #[error("checkpoint state does not match workflow type {0}")]
    StateMismatch(WorkflowType),

    /// The instance store failed while the workflow was running.
    #[error("workflow persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
