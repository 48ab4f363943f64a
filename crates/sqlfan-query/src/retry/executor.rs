//! Retry loops over a session or a session factory

use sqlfan_core::{Result, Row, Session, SessionFactory, close_quietly, query_all};

use super::RetryPolicy;

/// Execute `sql` on `session`, retrying failed attempts according to `policy`.
///
/// Each attempt opens and consumes its own cursor. After the last attempt
/// the last error is returned unchanged.
pub async fn execute_with_retry(
    session: &dyn Session,
    sql: &str,
    policy: &RetryPolicy,
) -> Result<Vec<Row>> {
    let mut attempt = 1u32;

    loop {
        match query_all(session, sql).await {
            Ok(rows) => return Ok(rows),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    error = %err,
                    "statement execution failed"
                );

                if attempt >= policy.max_attempts() || !policy.is_retryable(&err) {
                    return Err(err);
                }

                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}

/// Like [`execute_with_retry`], but every attempt opens a fresh session from
/// `factory` and closes it before the attempt ends.
///
/// A failure to connect counts as a failed attempt.
pub async fn connect_and_execute_with_retry(
    factory: &dyn SessionFactory,
    sql: &str,
    policy: &RetryPolicy,
) -> Result<Vec<Row>> {
    let mut attempt = 1u32;

    loop {
        let result = match factory.connect().await {
            Ok(session) => {
                let result = query_all(session.as_ref(), sql).await;
                close_quietly(session.as_ref()).await;
                result
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(rows) => return Ok(rows),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    error = %err,
                    "statement execution failed"
                );

                if attempt >= policy.max_attempts() || !policy.is_retryable(&err) {
                    return Err(err);
                }

                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}
