//! In-memory adapters for the workflow substrate.

mod instance_store;

pub use instance_store::InMemoryWorkflowInstanceStore;
