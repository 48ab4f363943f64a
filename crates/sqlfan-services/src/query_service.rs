//! Query execution service
//!
//! Splits a script into statements and runs them with the concurrent runner.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlfan_core::SessionFactory;
use sqlfan_query::{ConcurrentRunner, ExecutionResult, RunnerOptions, StatementBatch, split};

/// Counts over the results of one script run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall time of the whole batch
    pub elapsed: Duration,
}

impl ExecutionSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Results of one script run, in statement order
#[derive(Debug, Clone)]
pub struct ScriptExecution {
    pub results: Vec<ExecutionResult>,
    pub summary: ExecutionSummary,
}

/// Service for running SQL scripts against a session factory
pub struct QueryService {
    factory: Arc<dyn SessionFactory>,
    runner: ConcurrentRunner,
}

impl QueryService {
    pub fn new(factory: Arc<dyn SessionFactory>, options: RunnerOptions) -> Self {
        Self {
            factory,
            runner: ConcurrentRunner::new(options),
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        self.runner.options()
    }

    /// Split `script` on `;` and execute every statement concurrently
    #[tracing::instrument(skip(self, script), fields(script_len = script.len()))]
    pub async fn execute_script(&self, script: &str) -> ScriptExecution {
        self.execute_batch(split(script)).await
    }

    /// Execute an already split batch
    pub async fn execute_batch(&self, batch: StatementBatch) -> ScriptExecution {
        let start = Instant::now();
        let results = self.runner.run(batch, self.factory.clone()).await;

        let failed = results.iter().filter(|r| r.is_failure()).count();
        let summary = ExecutionSummary {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
            elapsed: start.elapsed(),
        };

        ScriptExecution { results, summary }
    }
}
