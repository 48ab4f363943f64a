//! Retry policy for single-statement execution

use std::sync::Arc;
use std::time::Duration;

use sqlfan_core::SqlfanError;

type RetryPredicate = Arc<dyn Fn(&SqlfanError) -> bool + Send + Sync>;

/// Bounded retry with a flat delay between attempts.
///
/// There is no backoff growth and no jitter. Which errors are worth another
/// attempt is decided by a pluggable predicate; the default retries every
/// error.
///
/// # Example
///
/// ```
/// use sqlfan_query::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay(), Duration::from_secs(1));
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    max_attempts: u32,
    /// Pause between consecutive attempts
    delay: Duration,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Create a policy that retries every error.
    ///
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: Arc::new(|_: &SqlfanError| true),
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Replace the retryable-error predicate
    pub fn with_retryable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SqlfanError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    /// Only retry connection failures; query and validation errors surface at once
    pub fn connection_errors_only(self) -> Self {
        self.with_retryable(SqlfanError::is_connection)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Check if `error` should trigger another attempt
    pub fn is_retryable(&self, error: &SqlfanError) -> bool {
        (self.retryable)(error)
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 1 second apart
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
