//! Concurrent batch execution
//!
//! Runs every statement of a `StatementBatch` on its own session, bounded by a
//! configurable concurrency limit, and reports one `ExecutionResult` per
//! statement in submission order.

mod executor;

pub use executor::{ConcurrentRunner, ExecutionResult, Outcome, RunnerOptions, run};
