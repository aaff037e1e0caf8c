//! Unit tests for task records, boards and the record service.
