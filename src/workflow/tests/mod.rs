//! Unit tests for workflow domain types, retry policy, activities, runtime,
//! definitions, instance stores and the orchestration service.

mod activity_tests;
mod service_tests;
mod support;
