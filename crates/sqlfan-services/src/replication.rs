//! Schema replication between two accounts
//!
//! Copies the table definitions of the source schema into the destination,
//! then copies the rows of every base table in fixed-size chunks. A failing
//! table is reported and skipped; the remaining tables are still copied.
//! A source table without rows is reported as empty, since the loader
//! never sees it and the destination table exists only through the DDL.

use std::sync::Arc;

use sqlfan_core::{
    ConnectionParams, Driver, Session, Table, TableLoader, TableTarget, close_quietly, query_all,
    query_one,
};
use sqlfan_query::metadata::names_from_rows;

use crate::error::ServiceResult;

/// Rows written per loader call
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Procedural script returning the concatenated DDL of every base table in
/// `schema` as a single cell
pub fn ddl_collection_script(schema: &str) -> String {
    format!(
        r#"DECLARE
    CUR CURSOR FOR SELECT CONCAT_WS('.',TABLE_CATALOG,TABLE_SCHEMA,'"'||TABLE_NAME||'"') AS NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
    AND TABLE_NAME NOT LIKE '%TEMP_VIEW_DEFS%'
    AND TABLE_SCHEMA='{schema}'
    AND IS_TEMPORARY='NO'
    ORDER BY CREATED ASC;
BEGIN
    CREATE OR REPLACE TEMPORARY TABLE TEMP_VIEW_DEFS(VIEW_NAME TEXT, DEFINITION TEXT);
    FOR rec IN CUR DO
        EXECUTE IMMEDIATE REPLACE(
            'INSERT INTO TEMP_VIEW_DEFS(VIEW_NAME, DEFINITION)
            SELECT ''<VIEW_NAME>'', GET_DDL(''TABLE'', ''<VIEW_NAME>'')',
            '<VIEW_NAME>',
            rec.NAME
        );
    END FOR;
    LET rs RESULTSET := (SELECT LISTAGG(DEFINITION,' ') DDL FROM TEMP_VIEW_DEFS);
    RETURN TABLE(rs);
END;"#
    )
}

/// Script recreating `database.schema` on the destination and replaying `ddl` in it
pub fn setup_script(database: &str, schema: &str, ddl: &str) -> String {
    format!(
        "BEGIN
    create or replace database {database};
    create or replace schema {database}.{schema};
    USE {database}.{schema};
    {ddl}
END;"
    )
}

/// Script listing the base tables of `database.schema`; names are in column 1
pub fn table_list_script(database: &str, schema: &str) -> String {
    format!(
        r#"BEGIN
    SHOW TABLES IN {database}.{schema};
    LET A := SQLID;
    LET rs RESULTSET := (SELECT * FROM TABLE(RESULT_SCAN(:A)) WHERE "kind" = 'TABLE');
    RETURN TABLE(rs);
END;"#
    )
}

/// `SELECT *` over a quoted, fully qualified table name
pub fn select_all_sql(database: &str, schema: &str, table: &str) -> String {
    format!(r#"SELECT * FROM "{}"."{}"."{}""#, database, schema, table)
}

/// Outcome of copying one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReplication {
    pub table: String,
    /// Rows written to the destination
    pub rows: u64,
    /// Failure message, if the table could not be copied completely
    pub error: Option<String>,
    /// The source returned no rows, so nothing reached the loader
    pub source_empty: bool,
}

impl TableReplication {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Progress notification sent after each table
#[derive(Debug, Clone)]
pub struct ReplicationProgress<'a> {
    /// 1-based position of the table
    pub table_index: usize,
    pub total_tables: usize,
    pub outcome: &'a TableReplication,
}

impl ReplicationProgress<'_> {
    /// Fraction of tables processed, in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_tables == 0 {
            1.0
        } else {
            self.table_index as f64 / self.total_tables as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    pub tables: Vec<TableReplication>,
}

impl ReplicationReport {
    pub fn replicated(&self) -> usize {
        self.tables.iter().filter(|t| t.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.tables.len() - self.replicated()
    }

    /// Tables that succeeded without any rows to copy
    pub fn empty(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.is_success() && t.source_empty)
            .count()
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Copies a schema from one account to another
pub struct ReplicationService {
    source: Arc<dyn Driver>,
    destination: Arc<dyn Driver>,
    destination_loader: Arc<dyn TableLoader>,
    chunk_size: usize,
}

impl ReplicationService {
    pub fn new(
        source: Arc<dyn Driver>,
        destination: Arc<dyn Driver>,
        destination_loader: Arc<dyn TableLoader>,
    ) -> Self {
        Self {
            source,
            destination,
            destination_loader,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the rows per loader call, clamped to at least 1
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Replicate the source schema into the destination.
    ///
    /// Structure is recreated under the source database and schema names;
    /// rows are written into the destination's configured database and
    /// schema. Connection, DDL and table-listing failures abort the run.
    #[tracing::instrument(
        skip_all,
        fields(database = %source.database, schema = %source.schema)
    )]
    pub async fn replicate<F>(
        &self,
        source: &ConnectionParams,
        destination: &ConnectionParams,
        mut on_progress: F,
    ) -> ServiceResult<ReplicationReport>
    where
        F: FnMut(ReplicationProgress<'_>) + Send,
    {
        source.validate()?;
        destination.validate()?;

        let source_session = self.source.connect(source).await?;
        let result = self
            .replicate_from(source_session.as_ref(), source, destination, &mut on_progress)
            .await;
        close_quietly(source_session.as_ref()).await;
        result
    }

    async fn replicate_from<F>(
        &self,
        source_session: &dyn Session,
        source: &ConnectionParams,
        destination: &ConnectionParams,
        on_progress: &mut F,
    ) -> ServiceResult<ReplicationReport>
    where
        F: FnMut(ReplicationProgress<'_>) + Send,
    {
        let ddl = query_one(source_session, &ddl_collection_script(&source.schema))
            .await?
            .and_then(|row| row.get(0).filter(|v| !v.is_null()).map(|v| v.to_string()))
            .unwrap_or_default();

        let destination_session = self.destination.connect(destination).await?;
        let setup = query_all(
            destination_session.as_ref(),
            &setup_script(&source.database, &source.schema, &ddl),
        )
        .await;
        close_quietly(destination_session.as_ref()).await;
        setup?;
        tracing::info!("destination structure created");

        let rows = query_all(
            source_session,
            &table_list_script(&source.database, &source.schema),
        )
        .await?;
        let tables = names_from_rows(&rows, 1)?;
        let total_tables = tables.len();
        tracing::info!(total_tables, "replicating tables");

        let mut report = ReplicationReport::default();
        for (index, table) in tables.into_iter().enumerate() {
            let outcome = self
                .copy_table(source_session, source, destination, &table)
                .await;
            if let Some(error) = &outcome.error {
                tracing::warn!(table = %table, %error, "table replication failed");
            } else if outcome.source_empty {
                tracing::info!(table = %table, "source table is empty, no rows copied");
            }
            on_progress(ReplicationProgress {
                table_index: index + 1,
                total_tables,
                outcome: &outcome,
            });
            report.tables.push(outcome);
        }

        tracing::info!(
            replicated = report.replicated(),
            failed = report.failed(),
            empty = report.empty(),
            rows = report.total_rows(),
            "replication finished"
        );
        Ok(report)
    }

    async fn copy_table(
        &self,
        source_session: &dyn Session,
        source: &ConnectionParams,
        destination: &ConnectionParams,
        table: &str,
    ) -> TableReplication {
        let mut outcome = TableReplication {
            table: table.to_string(),
            rows: 0,
            error: None,
            source_empty: false,
        };

        let sql = select_all_sql(&source.database, &source.schema, table);
        let data = match query_all(source_session, &sql).await {
            Ok(rows) => Table::from_rows(rows),
            Err(e) => {
                outcome.error = Some(e.message().to_string());
                return outcome;
            }
        };

        let target = match TableTarget::new(&destination.database, &destination.schema, table) {
            Ok(target) => target,
            Err(e) => {
                outcome.error = Some(e.message().to_string());
                return outcome;
            }
        };

        if data.row_count() == 0 {
            outcome.source_empty = true;
            return outcome;
        }

        for chunk in data.chunks(self.chunk_size) {
            match self.destination_loader.write_table(&chunk, &target, true).await {
                Ok(written) => outcome.rows += written,
                Err(e) => {
                    outcome.error = Some(e.message().to_string());
                    break;
                }
            }
        }
        outcome
    }
}
