//! Relai: task lifecycle orchestration.
//!
//! This crate coordinates task creation, assignment, deadline monitoring,
//! relay between users, onboarding and periodic cleanup as long-running,
//! resumable workflows with signals, timers and retriable activities.
//!
//! # Architecture
//!
//! Relai follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`task`]: Task records and per-user workflow boards
//! - [`notification`]: Fire-and-forget user notifications
//! - [`workflow`]: Workflow definitions, activities and the durable runtime
//! - [`telemetry`]: Tracing set-up for binaries

pub mod notification;
pub mod task;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
mod test_support;
