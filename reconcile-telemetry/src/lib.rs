//! Logging setup shared by the reconciler binary and the test suites.

pub mod tracing;
