//! SQLite session implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection as RusqliteConnection;
use sqlfan_core::{Cursor, Result, Row, Session, SqlfanError};
use std::path::Path;
use std::sync::Arc;

use crate::connection::{from_sqlite, open, query_error, run_blocking};

/// Rows of an executed statement, fetched eagerly
struct SqliteCursor {
    rows: Vec<Row>,
}

#[async_trait]
impl Cursor for SqliteCursor {
    async fn fetch_all(self: Box<Self>) -> Result<Vec<Row>> {
        Ok(self.rows)
    }
}

/// One rusqlite connection. Closing drops the connection.
pub struct SqliteSession {
    conn: Arc<Mutex<Option<RusqliteConnection>>>,
}

impl SqliteSession {
    /// Open a session on the database file at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let conn = run_blocking(move || open(&path)).await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }
}

#[async_trait]
impl Session for SqliteSession {
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<Box<dyn Cursor>> {
        let conn = self.conn.clone();
        let sql = sql.to_string();

        let rows = run_blocking(move || {
            let guard = conn.lock();
            let conn = guard
                .as_ref()
                .ok_or_else(|| SqlfanError::Connection("session is closed".into()))?;
            query_rows(conn, &sql)
        })
        .await?;

        tracing::debug!(row_count = rows.len(), "statement executed");
        Ok(Box::new(SqliteCursor { rows }))
    }

    async fn close(&self) -> Result<()> {
        if self.conn.lock().take().is_some() {
            tracing::debug!("closing SQLite session");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// Prepare, run and materialize one statement
fn query_rows(conn: &RusqliteConnection, sql: &str) -> Result<Vec<Row>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| query_error("Failed to prepare statement", e))?;

    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut result_rows = stmt
        .query([])
        .map_err(|e| query_error("Failed to execute statement", e))?;

    while let Some(row) = result_rows
        .next()
        .map_err(|e| query_error("Failed to fetch row", e))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let value = row
                .get_ref(i)
                .map_err(|e| query_error("Failed to read column", e))?;
            values.push(from_sqlite(value));
        }
        rows.push(Row::new(columns.clone(), values));
    }

    Ok(rows)
}
