//! Workflow instance identity.

use super::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identifier of a workflow instance.
///
/// Identifiers are usually derived as `{type-prefix}-{natural key}` so that
/// starting the same logical process twice collides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Creates a validated workflow identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::EmptyWorkflowId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkflowError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::EmptyWorkflowId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(value: WorkflowId) -> Self {
        value.0
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
