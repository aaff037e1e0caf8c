//! File-backed adapters for the workflow substrate.

mod instance_store;

pub use instance_store::{FileWorkflowInstanceStore, TABLE_FILE};
