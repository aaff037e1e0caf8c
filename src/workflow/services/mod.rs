//! Boundary API for starting, signalling and querying workflows.

mod orchestration;

pub use orchestration::{
    CLEANUP_SINGLETON_ID, OrchestrationError, OrchestrationResult, OrchestrationService,
};
