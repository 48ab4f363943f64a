//! DDL extraction through `GET_DDL`

use regex::Regex;
use sqlfan_core::{Result, Session, SqlfanError, query_one};
use std::sync::LazyLock;

use crate::metadata::ObjectKind;

/// Placed between consecutive DDL scripts when several objects are scripted together
pub const DDL_SEPARATOR: &str = "\n\n-------------------------------------------------------------------------------------------\n\n";

// Listed routine names carry their signature: `NAME(ARGS) RETURN TYPE`
static RETURN_CLAUSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*?) RETURN.*").expect("valid regex"));

/// Drop the ` RETURN ...` tail of a listed routine name, keeping the argument list
pub fn strip_signature(name: &str) -> String {
    RETURN_CLAUSE_REGEX.replace(name, "$1").into_owned()
}

pub fn object_ddl_sql(kind: ObjectKind, database: &str, schema: &str, name: &str) -> String {
    format!(
        "SELECT GET_DDL('{}', '{}.{}.{}', true)",
        kind.ddl_type(),
        database,
        schema,
        strip_signature(name)
    )
}

pub fn database_ddl_sql(database: &str) -> String {
    format!("SELECT GET_DDL('DATABASE', '{}', true)", database)
}

/// Join DDL scripts with [`DDL_SEPARATOR`]
pub fn join_ddl<S: AsRef<str>>(scripts: &[S]) -> String {
    scripts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(DDL_SEPARATOR)
}

/// Fetch the DDL of one schema-level object
pub async fn object_ddl(
    session: &dyn Session,
    kind: ObjectKind,
    database: &str,
    schema: &str,
    name: &str,
) -> Result<String> {
    let sql = object_ddl_sql(kind, database, schema, name);
    tracing::debug!(kind = %kind, %database, %schema, %name, "fetching object DDL");
    first_cell(session, &sql).await
}

/// Fetch the DDL of a whole database
pub async fn database_ddl(session: &dyn Session, database: &str) -> Result<String> {
    tracing::debug!(%database, "fetching database DDL");
    first_cell(session, &database_ddl_sql(database)).await
}

async fn first_cell(session: &dyn Session, sql: &str) -> Result<String> {
    let row = query_one(session, sql)
        .await?
        .ok_or_else(|| SqlfanError::Query(format!("no DDL returned by: {}", sql)))?;
    match row.get(0) {
        Some(value) if !value.is_null() => Ok(value.to_string()),
        _ => Err(SqlfanError::Query(format!("no DDL returned by: {}", sql))),
    }
}
