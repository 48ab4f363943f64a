//! Opening connections and converting values

use rusqlite::Connection as RusqliteConnection;
use rusqlite::OpenFlags;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use sqlfan_core::{Result, SqlfanError, Value};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits for a lock held by another session
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether `path` names a private in-memory database
pub(crate) fn is_memory(path: &Path) -> bool {
    path.as_os_str() == ":memory:"
}

/// Open a read-write connection, creating the file if needed
pub(crate) fn open(path: &Path) -> Result<RusqliteConnection> {
    let is_memory = is_memory(path);
    let conn = if is_memory {
        RusqliteConnection::open_in_memory().map_err(|e| {
            SqlfanError::Connection(format!("Failed to open in-memory database: {}", e))
        })?
    } else {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(SqlfanError::Connection(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
            SqlfanError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                path.display(),
                e
            ))
        })?
    };

    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| SqlfanError::Connection(format!("Failed to set busy timeout: {}", e)))?;
    if !is_memory {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| SqlfanError::Connection(format!("Failed to set journal mode: {}", e)))?;
    }

    Ok(conn)
}

/// Run blocking SQLite work off the async runtime
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SqlfanError::Other(format!("SQLite worker failed: {}", e)))?
}

pub(crate) fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Int(i) => SqliteValue::Integer(*i),
        Value::Float(f) => SqliteValue::Real(*f),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Bytes(b) => SqliteValue::Blob(b.clone()),
        Value::Date(d) => SqliteValue::Text(d.to_string()),
        Value::Timestamp(ts) => SqliteValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
    }
}

pub(crate) fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

/// Column affinity for a value, used when creating tables
pub(crate) fn affinity(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) | Value::Int(_) => "INTEGER",
        Value::Float(_) => "REAL",
        Value::Bytes(_) => "BLOB",
        Value::Null | Value::Text(_) | Value::Date(_) | Value::Timestamp(_) => "TEXT",
    }
}

/// Quote an identifier, doubling embedded quotes
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn query_error(context: &str, err: rusqlite::Error) -> SqlfanError {
    SqlfanError::Query(format!("{}: {}", context, err))
}
