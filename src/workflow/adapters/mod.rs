//! Adapter implementations for workflow ports.

pub mod file;
pub mod memory;
