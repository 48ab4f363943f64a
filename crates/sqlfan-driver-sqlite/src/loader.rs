//! Bulk table writes into SQLite

use async_trait::async_trait;
use rusqlite::{Connection as RusqliteConnection, OptionalExtension, params_from_iter};
use sqlfan_core::{Result, SqlfanError, Table, TableLoader, TableTarget};
use std::path::{Path, PathBuf};

use crate::connection::{
    affinity, is_memory, open, query_error, quote_ident, run_blocking, to_sqlite,
};

/// Writes tables into one SQLite database file.
///
/// All rows of a write are inserted in a single transaction. Every write
/// opens its own connection, so `:memory:` is rejected: the rows would land in
/// a private database that vanishes with the connection.
#[derive(Debug, Clone)]
pub struct SqliteLoader {
    path: PathBuf,
}

impl SqliteLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TableLoader for SqliteLoader {
    #[tracing::instrument(skip(self, table), fields(rows = table.row_count()))]
    async fn write_table(
        &self,
        table: &Table,
        target: &TableTarget,
        auto_create: bool,
    ) -> Result<u64> {
        if is_memory(&self.path) {
            return Err(SqlfanError::Configuration(
                "table loads need a database file, ':memory:' does not persist between writes"
                    .into(),
            ));
        }
        if table.column_count() == 0 {
            return Ok(0);
        }

        let path = self.path.clone();
        let table = table.clone();
        let name = target.table.clone();

        let written = run_blocking(move || {
            let mut conn = open(&path)?;
            write_rows(&mut conn, &table, &name, auto_create)
        })
        .await?;

        tracing::debug!(table = %target.table, rows = written, "rows written");
        Ok(written)
    }
}

fn table_exists(conn: &RusqliteConnection, name: &str) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(|e| query_error("Failed to look up table", e))
}

/// `CREATE TABLE` with each column's affinity taken from its first non-null value
fn create_table_sql(table: &Table, name: &str) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let column_type = table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .find(|value| !value.is_null())
                .map(affinity)
                .unwrap_or("TEXT");
            format!("{} {}", quote_ident(column), column_type)
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(name),
        columns.join(", ")
    )
}

fn insert_sql(table: &Table, name: &str) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn write_rows(
    conn: &mut RusqliteConnection,
    table: &Table,
    name: &str,
    auto_create: bool,
) -> Result<u64> {
    if !table_exists(conn, name)? {
        if !auto_create {
            return Err(SqlfanError::Query(format!(
                "Table '{}' does not exist",
                name
            )));
        }
        conn.execute(&create_table_sql(table, name), [])
            .map_err(|e| query_error("Failed to create table", e))?;
        tracing::debug!(table = %name, "created table");
    }

    let tx = conn
        .transaction()
        .map_err(|e| query_error("Failed to begin transaction", e))?;
    {
        let mut stmt = tx
            .prepare(&insert_sql(table, name))
            .map_err(|e| query_error("Failed to prepare insert", e))?;
        for row in &table.rows {
            let values = row.iter().map(to_sqlite);
            stmt.execute(params_from_iter(values))
                .map_err(|e| query_error("Failed to insert row", e))?;
        }
    }
    tx.commit()
        .map_err(|e| query_error("Failed to commit transaction", e))?;

    Ok(table.row_count() as u64)
}
