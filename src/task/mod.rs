//! Task records and user workflow boards.
//!
//! Workflows never touch storage directly: every task write goes through
//! [`services::TaskRecordService`], which coordinates the task store and the
//! per-user board. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Application services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
