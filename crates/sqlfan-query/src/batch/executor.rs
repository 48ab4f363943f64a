//! Concurrent statement runner implementation

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use sqlfan_core::{Result, Row, SessionFactory, SqlfanError, close_quietly, query_all};
use tokio::time::Instant;

use crate::StatementBatch;

/// Default upper bound on concurrently executing statements
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Configuration options for the concurrent runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Maximum number of statements (and therefore sessions) in flight at once
    pub max_concurrency: usize,
}

impl RunnerOptions {
    /// Create new runner options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency bound, clamped to at least 1
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Effective number of workers for a batch of `len` statements
    pub fn workers_for(&self, len: usize) -> usize {
        len.min(self.max_concurrency.max(1))
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// What happened to one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Statement executed; every resulting row was fetched
    Success { rows: Vec<Row> },
    /// Statement failed; `message` is the driver's error text, verbatim
    Failure { message: String },
}

/// Result of executing one statement of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Index of this statement in the batch (0-based)
    pub index: usize,
    /// The SQL that was executed
    pub statement: String,
    pub outcome: Outcome,
    /// Wall time from session acquisition through the last fetched row
    pub elapsed: Duration,
}

impl ExecutionResult {
    fn from_result(index: usize, statement: String, result: Result<Vec<Row>>, elapsed: Duration) -> Self {
        let outcome = match result {
            Ok(rows) => Outcome::Success { rows },
            Err(e) => Outcome::Failure {
                message: e.message().to_string(),
            },
        };
        Self {
            index,
            statement,
            outcome,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure { .. })
    }

    /// Rows of a successful statement
    pub fn rows(&self) -> Option<&[Row]> {
        match &self.outcome {
            Outcome::Success { rows } => Some(rows),
            Outcome::Failure { .. } => None,
        }
    }

    /// Error message of a failed statement
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure { message } => Some(message),
        }
    }
}

/// Runs the statements of a batch concurrently, one session per statement
#[derive(Debug, Clone, Default)]
pub struct ConcurrentRunner {
    options: RunnerOptions,
}

impl ConcurrentRunner {
    /// Create a new runner with the given options
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    /// Get the current options
    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Execute every statement of `batch`.
    ///
    /// Each statement opens its own session from `factory` and closes it
    /// afterwards. Failures are reported per statement and never abort the
    /// rest of the batch. Results come back in batch order.
    pub async fn run(
        &self,
        batch: StatementBatch,
        factory: Arc<dyn SessionFactory>,
    ) -> Vec<ExecutionResult> {
        if batch.is_empty() {
            return Vec::new();
        }

        let batch_start = Instant::now();
        let workers = self.options.workers_for(batch.len());
        tracing::debug!(statements = batch.len(), workers, "running statement batch");

        let semaphore = Arc::new(tokio::sync::Semaphore::new(workers));
        let statements = batch.into_statements();
        let mut handles = Vec::with_capacity(statements.len());

        for (index, sql) in statements.iter().cloned().enumerate() {
            let factory = factory.clone();
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                // Acquire semaphore permit
                let _permit = semaphore.acquire_owned().await;

                let start = Instant::now();
                let result = AssertUnwindSafe(execute_statement(factory.as_ref(), &sql))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(task_panic(panic)));
                let elapsed = start.elapsed();

                if let Err(e) = &result {
                    tracing::debug!(index, error = %e, "statement failed");
                }
                ExecutionResult::from_result(index, sql, result, elapsed)
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, (handle, sql)) in handles.into_iter().zip(statements).enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    // Task was cancelled by runtime shutdown
                    results.push(ExecutionResult {
                        index,
                        statement: sql,
                        outcome: Outcome::Failure {
                            message: format!("Task error: {}", e),
                        },
                        elapsed: Duration::ZERO,
                    });
                }
            }
        }

        let failures = results.iter().filter(|r| r.is_failure()).count();
        tracing::info!(
            statements = results.len(),
            failures,
            elapsed_ms = batch_start.elapsed().as_millis() as u64,
            "statement batch finished"
        );

        results
    }
}

/// Run `batch` with at most `max_concurrency` statements in flight
pub async fn run(
    batch: StatementBatch,
    factory: Arc<dyn SessionFactory>,
    max_concurrency: usize,
) -> Vec<ExecutionResult> {
    ConcurrentRunner::new(RunnerOptions::new().with_max_concurrency(max_concurrency))
        .run(batch, factory)
        .await
}

/// Open a session, run one statement, close the session.
///
/// The session is closed even when the driver panics mid-statement.
async fn execute_statement(factory: &dyn SessionFactory, sql: &str) -> Result<Vec<Row>> {
    let session = factory.connect().await?;
    let result = AssertUnwindSafe(query_all(session.as_ref(), sql))
        .catch_unwind()
        .await;
    close_quietly(session.as_ref()).await;
    result.unwrap_or_else(|panic| Err(task_panic(panic)))
}

fn task_panic(panic: Box<dyn Any + Send>) -> SqlfanError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    SqlfanError::Other(format!("Task error: {}", message))
}
