//! SQLFAN Query - Statement splitting and execution
//!
//! This crate provides the statement splitter, the concurrent batch runner,
//! the retrying single-statement executor and the metadata/DDL statement
//! builders used for schema introspection.

pub mod batch;
pub mod ddl;
pub mod metadata;
pub mod retry;
mod splitter;

pub use batch::{ConcurrentRunner, ExecutionResult, Outcome, RunnerOptions, run};
pub use ddl::{DDL_SEPARATOR, database_ddl, join_ddl, object_ddl};
pub use metadata::{ObjectKind, list_databases, list_objects, list_schemas};
pub use retry::{RetryPolicy, connect_and_execute_with_retry, execute_with_retry};
pub use splitter::{StatementBatch, split};
