//! Port contracts for the durable workflow substrate.

mod instance_store;

pub use instance_store::{InstanceStoreError, InstanceStoreResult, WorkflowInstanceStore};
