//! Synthetic table generation
//!
//! Produces tables of random or sequential values from per-column specs and
//! saves them through the [`TableLoader`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sqlfan_core::{Table, TableLoader, TableTarget, Value};

use crate::error::{ServiceError, ServiceResult};

/// How the values of one column are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Uniform integers in `[min, max)`
    Integer { min: i64, max: i64 },
    /// Uniform floats in `[min, max)`
    Float { min: f64, max: f64 },
    /// `str_0`, `str_1`, ...
    String,
    /// Dates evenly spaced from `start` to `end`, both included
    Date { start: NaiveDate, end: NaiveDate },
    /// Timestamps evenly spaced from `start` to `end`, both included
    Timestamp {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Random booleans
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    fn validate(&self) -> ServiceResult<()> {
        let invalid = |reason: &str| {
            Err(ServiceError::validation(format!(
                "column '{}': {}",
                self.name, reason
            )))
        };
        match &self.kind {
            ColumnKind::Integer { min, max } if min >= max => invalid("min must be below max"),
            ColumnKind::Float { min, max } if !(max - min).is_finite() => {
                invalid("min and max must be finite")
            }
            ColumnKind::Float { min, max } if min >= max => invalid("min must be below max"),
            ColumnKind::Date { start, end } if start > end => invalid("start is after end"),
            ColumnKind::Timestamp { start, end } if start > end => invalid("start is after end"),
            _ => Ok(()),
        }
    }
}

/// Check the row count and column specs before generating anything
pub fn validate_specs(columns: &[ColumnSpec], rows: usize) -> ServiceResult<()> {
    if rows == 0 {
        return Err(ServiceError::validation("row count must be at least 1"));
    }
    if columns.is_empty() {
        return Err(ServiceError::validation("at least one column is required"));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.name.trim().is_empty() {
            return Err(ServiceError::validation("column names must not be empty"));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(ServiceError::validation(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
        column.validate()?;
    }
    Ok(())
}

/// `count` points from `start` to `end` inclusive, evenly spaced in milliseconds
fn spaced_timestamps(start: NaiveDateTime, end: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    if count == 1 {
        return vec![start];
    }
    let span = (end - start).num_milliseconds() as i128;
    let steps = (count - 1) as i128;
    (0..count)
        .map(|i| {
            let offset = span * i as i128 / steps;
            start + TimeDelta::milliseconds(offset as i64)
        })
        .collect()
}

/// `count` dates from `start` to `end` inclusive, truncated to whole days
fn spaced_dates(start: NaiveDate, end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    if count == 1 {
        return vec![start];
    }
    let span = (end - start).num_days() as i128;
    let steps = (count - 1) as i128;
    (0..count)
        .map(|i| start + TimeDelta::days((span * i as i128 / steps) as i64))
        .collect()
}

/// Random table generator; deterministic when seeded
pub struct TestDataGenerator {
    rng: StdRng,
}

impl TestDataGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `rows` rows for `columns`
    pub fn generate(&mut self, columns: &[ColumnSpec], rows: usize) -> ServiceResult<Table> {
        validate_specs(columns, rows)?;

        let generated: Vec<Vec<Value>> = columns
            .iter()
            .map(|column| self.column_values(&column.kind, rows))
            .collect();

        let mut table = Table::new(columns.iter().map(|c| c.name.clone()).collect());
        for i in 0..rows {
            table.push_row(generated.iter().map(|values| values[i].clone()).collect());
        }
        Ok(table)
    }

    fn column_values(&mut self, kind: &ColumnKind, rows: usize) -> Vec<Value> {
        match kind {
            ColumnKind::Integer { min, max } => (0..rows)
                .map(|_| Value::Int(self.rng.gen_range(*min..*max)))
                .collect(),
            ColumnKind::Float { min, max } => (0..rows)
                .map(|_| Value::Float(self.rng.gen_range(*min..*max)))
                .collect(),
            ColumnKind::String => (0..rows).map(|i| Value::Text(format!("str_{}", i))).collect(),
            ColumnKind::Date { start, end } => spaced_dates(*start, *end, rows)
                .into_iter()
                .map(Value::Date)
                .collect(),
            ColumnKind::Timestamp { start, end } => spaced_timestamps(*start, *end, rows)
                .into_iter()
                .map(Value::Timestamp)
                .collect(),
            ColumnKind::Boolean => (0..rows).map(|_| Value::Bool(self.rng.gen_bool(0.5))).collect(),
        }
    }
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Service saving generated tables into one database and schema
pub struct TestDataService {
    loader: Arc<dyn TableLoader>,
    database: String,
    schema: String,
}

impl TestDataService {
    pub fn new(
        loader: Arc<dyn TableLoader>,
        database: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            database: database.into(),
            schema: schema.into(),
        }
    }

    /// Generate a table and write it into `table_name`, creating the table if
    /// needed. Returns the generated table and the number of rows written.
    #[tracing::instrument(skip(self, generator, columns), fields(columns = columns.len()))]
    pub async fn generate_and_save(
        &self,
        generator: &mut TestDataGenerator,
        table_name: &str,
        columns: &[ColumnSpec],
        rows: usize,
    ) -> ServiceResult<(Table, u64)> {
        let target = TableTarget::new(&self.database, &self.schema, table_name)?;
        let table = generator.generate(columns, rows)?;
        let written = self.loader.write_table(&table, &target, true).await?;
        tracing::info!(table = %target, rows = written, "saved generated data");
        Ok((table, written))
    }
}
