//! Task lifecycle orchestration: durable workflows over retriable
//! activities.
//!
//! A workflow instance is a stage machine whose state is checkpointed after
//! every step, so the [`runtime`] can resume it after a restart. Definitions
//! in [`definitions`] reach the outside world only through the
//! [`runtime::WorkflowContext`], which applies the [`policy`] table to each
//! [`activities`] call. The [`services::OrchestrationService`] is the
//! boundary the HTTP layer talks to.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod activities;
pub mod adapters;
pub mod definitions;
pub mod domain;
pub mod policy;
pub mod ports;
pub mod runtime;
pub mod services;

#[cfg(test)]
mod tests;
