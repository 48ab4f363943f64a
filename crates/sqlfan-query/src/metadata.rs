//! Catalog listing statements
//!
//! Builds the `SHOW ...` statements used to browse databases, schemas and
//! schema-level objects, and extracts the object names from their result
//! rows. Every listing goes through [`execute_with_retry`].

use serde::{Deserialize, Serialize};
use sqlfan_core::{Result, Row, Session, SqlfanError};

use crate::retry::{RetryPolicy, execute_with_retry};

/// Lists every database visible to the session
pub const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Column holding the name in `SHOW DATABASES` / `SHOW SCHEMAS` / `SHOW <objects>`
const NAME_COLUMN: usize = 1;

/// Column holding the name (with its argument signature) in `SHOW USER FUNCTIONS/PROCEDURES`
const USER_ROUTINE_NAME_COLUMN: usize = 8;

pub fn show_schemas_sql(database: &str) -> String {
    format!("SHOW SCHEMAS IN DATABASE {}", database)
}

/// Kinds of schema-level objects that can be listed and scripted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    DynamicTable,
    EventTable,
    FileFormat,
    Function,
    IcebergTable,
    MaskingPolicy,
    PasswordPolicy,
    Pipe,
    Procedure,
    RowAccessPolicy,
    Sequence,
    SessionPolicy,
    Stream,
    Table,
    Tag,
    Task,
    View,
}

impl ObjectKind {
    /// Every kind, in display order
    pub const ALL: [ObjectKind; 17] = [
        ObjectKind::DynamicTable,
        ObjectKind::EventTable,
        ObjectKind::FileFormat,
        ObjectKind::Function,
        ObjectKind::IcebergTable,
        ObjectKind::MaskingPolicy,
        ObjectKind::PasswordPolicy,
        ObjectKind::Pipe,
        ObjectKind::Procedure,
        ObjectKind::RowAccessPolicy,
        ObjectKind::Sequence,
        ObjectKind::SessionPolicy,
        ObjectKind::Stream,
        ObjectKind::Table,
        ObjectKind::Tag,
        ObjectKind::Task,
        ObjectKind::View,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectKind::DynamicTable => "Dynamic Table",
            ObjectKind::EventTable => "Event Table",
            ObjectKind::FileFormat => "File Format",
            ObjectKind::Function => "Function",
            ObjectKind::IcebergTable => "Iceberg Table",
            ObjectKind::MaskingPolicy => "Masking Policy",
            ObjectKind::PasswordPolicy => "Password Policy",
            ObjectKind::Pipe => "Pipe",
            ObjectKind::Procedure => "Procedure",
            ObjectKind::RowAccessPolicy => "Row Access Policy",
            ObjectKind::Sequence => "Sequence",
            ObjectKind::SessionPolicy => "Session Policy",
            ObjectKind::Stream => "Stream",
            ObjectKind::Table => "Table",
            ObjectKind::Tag => "Tag",
            ObjectKind::Task => "Task",
            ObjectKind::View => "View",
        }
    }

    /// Parse a kind from its display name, ignoring case, `_` and `-`
    pub fn from_name(name: &str) -> Option<ObjectKind> {
        let wanted = normalize(name);
        Self::ALL
            .into_iter()
            .find(|kind| normalize(kind.display_name()) == wanted)
    }

    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            ObjectKind::MaskingPolicy
                | ObjectKind::PasswordPolicy
                | ObjectKind::RowAccessPolicy
                | ObjectKind::SessionPolicy
        )
    }

    fn is_user_routine(&self) -> bool {
        matches!(self, ObjectKind::Function | ObjectKind::Procedure)
    }

    /// Statement listing objects of this kind in `database.schema`
    pub fn show_sql(&self, database: &str, schema: &str) -> String {
        let kind = self.display_name().to_uppercase();
        if self.is_user_routine() {
            format!("SHOW USER {}S IN SCHEMA {}.{}", kind, database, schema)
        } else {
            format!(
                "SHOW {}S IN SCHEMA {}.{}",
                kind.replace("POLICY", "POLICIE"),
                database,
                schema
            )
        }
    }

    /// Result column carrying the object name
    pub fn name_column(&self) -> usize {
        if self.is_user_routine() {
            USER_ROUTINE_NAME_COLUMN
        } else {
            NAME_COLUMN
        }
    }

    /// Object type argument for `GET_DDL`
    pub fn ddl_type(&self) -> String {
        if self.is_policy() {
            "Policy".to_string()
        } else {
            self.display_name().replace(' ', "_")
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = SqlfanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .ok_or_else(|| SqlfanError::Validation(format!("unknown object kind: {}", s)))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Take the text of column `column` from every row.
///
/// Rows that are too short or hold a non-text value are reported as a query
/// error rather than skipped.
pub fn names_from_rows(rows: &[Row], column: usize) -> Result<Vec<String>> {
    rows.iter()
        .map(|row| match row.get(column) {
            Some(value) if !value.is_null() => Ok(value.to_string()),
            _ => Err(SqlfanError::Query(format!(
                "listing row has no name in column {} ({} columns)",
                column,
                row.len()
            ))),
        })
        .collect()
}

/// Names of every database visible to `session`
pub async fn list_databases(session: &dyn Session, policy: &RetryPolicy) -> Result<Vec<String>> {
    let rows = execute_with_retry(session, SHOW_DATABASES, policy).await?;
    names_from_rows(&rows, NAME_COLUMN)
}

/// Names of the schemas in `database`
pub async fn list_schemas(
    session: &dyn Session,
    database: &str,
    policy: &RetryPolicy,
) -> Result<Vec<String>> {
    let rows = execute_with_retry(session, &show_schemas_sql(database), policy).await?;
    names_from_rows(&rows, NAME_COLUMN)
}

/// Names of the objects of `kind` in `database.schema`.
///
/// Functions and procedures come back with their signature, e.g.
/// `ADD_ONE(NUMBER) RETURN NUMBER`.
pub async fn list_objects(
    session: &dyn Session,
    kind: ObjectKind,
    database: &str,
    schema: &str,
    policy: &RetryPolicy,
) -> Result<Vec<String>> {
    let rows = execute_with_retry(session, &kind.show_sql(database, schema), policy).await?;
    names_from_rows(&rows, kind.name_column())
}
