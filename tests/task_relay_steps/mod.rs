//! Step definitions for task relay behaviour tests.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
