//! Table loader boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, SqlfanError, Table};

/// Fully qualified destination of a table write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTarget {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableTarget {
    /// Create a target, rejecting an empty table name
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let table = table.into().trim().to_string();
        if table.is_empty() {
            return Err(SqlfanError::Validation(
                "target table name must not be empty".into(),
            ));
        }
        Ok(Self {
            database: database.into(),
            schema: schema.into(),
            table,
        })
    }

    /// `database.schema.table`, skipping empty qualifiers
    pub fn qualified_name(&self) -> String {
        [&self.database, &self.schema, &self.table]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for TableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Column-oriented bulk writer.
///
/// With `auto_create` the destination table is created from the table's
/// columns when it does not exist yet.
#[async_trait]
pub trait TableLoader: Send + Sync {
    /// Write every row of `table` into `target`, returning the number of rows written
    async fn write_table(&self, table: &Table, target: &TableTarget, auto_create: bool)
    -> Result<u64>;
}
