//! Workflow domain: identities, inputs, signals and checkpointed state.

mod error;
mod ids;
mod input;
mod instance;
mod kind;
mod signal;
mod state;

pub use error::WorkflowError;
pub use ids::WorkflowId;
pub use input::{
    MAX_CLEANUP_INTERVAL_DAYS, PeriodicCleanupInput, TaskRelayInput, UserOnboardingInput,
    WorkflowInput,
};
pub use instance::{
    WorkflowClosure, WorkflowDescription, WorkflowInstance, WorkflowOutput,
};
pub use kind::{WorkflowStatus, WorkflowType};
pub use signal::WorkflowSignal;
pub use state::{
    LifecycleStage, OnboardingStage, PeriodicCleanupState, RelayStage, TaskLifecycleState,
    TaskRelayState, UserOnboardingState, WorkflowState,
};
