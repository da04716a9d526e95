//! Application services - orchestrate use cases.
//!
//! The only use case is "exercise the generator against every backend".

pub mod test_runner;

pub use test_runner::{BackendReport, RunReport, RunnerSettings, SuiteSummary, TestRunner};
