//! Session, cursor and session factory traits

use crate::{ConnectionParams, Result, Row};
use async_trait::async_trait;
use std::sync::Arc;

/// Handle returned by `Session::execute`, consumed when its rows are fetched.
#[async_trait]
pub trait Cursor: Send {
    /// Fetch every remaining row
    async fn fetch_all(self: Box<Self>) -> Result<Vec<Row>>;

    /// Fetch the first row, if any
    async fn fetch_one(self: Box<Self>) -> Result<Option<Row>> {
        Ok(self.fetch_all().await?.into_iter().next())
    }
}

/// A live, closable warehouse session
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute a statement and return a cursor over its result
    async fn execute(&self, sql: &str) -> Result<Box<dyn Cursor>>;

    /// Close the session
    async fn close(&self) -> Result<()>;

    /// Check if the session is closed
    fn is_closed(&self) -> bool;
}

/// Opens sessions on demand.
///
/// Every call returns a fresh session owned by the caller, who is
/// responsible for closing it.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn Session>>;
}

#[async_trait]
impl<T: SessionFactory> SessionFactory for Arc<T> {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        (**self).connect().await
    }
}

/// A database driver: turns a credential bundle into a session
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Short identifier (e.g. "sqlite")
    fn name(&self) -> &'static str;

    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>>;
}

/// A `SessionFactory` that binds a driver to one credential bundle
pub struct DriverSessionFactory {
    driver: Arc<dyn Driver>,
    params: ConnectionParams,
}

impl DriverSessionFactory {
    pub fn new(driver: Arc<dyn Driver>, params: ConnectionParams) -> Self {
        Self { driver, params }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[async_trait]
impl SessionFactory for DriverSessionFactory {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        tracing::debug!(
            driver = self.driver.name(),
            account = %self.params.account,
            "opening session"
        );
        self.driver.connect(&self.params).await
    }
}

/// Execute `sql` on `session` and fetch all resulting rows
pub async fn query_all(session: &dyn Session, sql: &str) -> Result<Vec<Row>> {
    let cursor = session.execute(sql).await?;
    cursor.fetch_all().await
}

/// Execute `sql` on `session` and fetch the first row
pub async fn query_one(session: &dyn Session, sql: &str) -> Result<Option<Row>> {
    let cursor = session.execute(sql).await?;
    cursor.fetch_one().await
}

/// Close a session, logging instead of failing.
///
/// Used on paths where the statement outcome is already decided and a close
/// error must not replace it.
pub async fn close_quietly(session: &dyn Session) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SqlfanError, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct RowsCursor(Vec<Row>);

    #[async_trait]
    impl Cursor for RowsCursor {
        async fn fetch_all(self: Box<Self>) -> Result<Vec<Row>> {
            Ok(self.0)
        }
    }

    struct EchoSession {
        closed: AtomicBool,
    }

    #[async_trait]
    impl Session for EchoSession {
        async fn execute(&self, sql: &str) -> Result<Box<dyn Cursor>> {
            if sql.starts_with("BAD") {
                return Err(SqlfanError::Query(format!("syntax error in '{}'", sql)));
            }
            Ok(Box::new(RowsCursor(vec![
                Row::from_pairs([("sql", sql)]),
                Row::from_pairs([("sql", "second")]),
            ])))
        }

        async fn close(&self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    struct EchoDriver {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Driver for EchoDriver {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
            self.seen.lock().unwrap().push(params.account.clone());
            Ok(Box::new(EchoSession {
                closed: AtomicBool::new(false),
            }))
        }
    }

    #[tokio::test]
    async fn test_query_helpers() {
        let session = EchoSession {
            closed: AtomicBool::new(false),
        };

        let rows = query_all(&session, "SELECT 1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some(&Value::Text("SELECT 1".into())));

        let first = query_one(&session, "SELECT 2").await.unwrap().unwrap();
        assert_eq!(first.get(0), Some(&Value::Text("SELECT 2".into())));

        let err = query_all(&session, "BAD SQL").await.unwrap_err();
        assert_eq!(err.message(), "syntax error in 'BAD SQL'");
    }

    #[tokio::test]
    async fn test_driver_session_factory_passes_params_through() {
        let driver = Arc::new(EchoDriver {
            seen: Mutex::new(Vec::new()),
        });
        let params = ConnectionParams {
            account: "acme".into(),
            ..ConnectionParams::default()
        };
        let factory = DriverSessionFactory::new(driver.clone(), params);

        let session = factory.connect().await.unwrap();
        close_quietly(session.as_ref()).await;

        assert!(session.is_closed());
        assert_eq!(*driver.seen.lock().unwrap(), vec!["acme".to_string()]);
    }
}
