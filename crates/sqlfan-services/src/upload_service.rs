//! File upload into warehouse tables
//!
//! Reads a delimited text file or the first sheet of a workbook into a
//! [`Table`], inferring a value type per cell, and hands it to the
//! [`TableLoader`] with table auto-creation on.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use calamine::{Data, Reader, open_workbook_auto};
use sqlfan_core::{Table, TableLoader, TableTarget, Value};

use crate::error::{ServiceError, ServiceResult};

/// Input file formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated text with a header row (`.csv`, `.txt`)
    Delimited,
    /// Excel workbook (`.xls`, `.xlsx`)
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from the file extension, ignoring case
    pub fn from_path(path: &Path) -> ServiceResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(FileFormat::Delimited),
            "xls" | "xlsx" => Ok(FileFormat::Spreadsheet),
            _ => Err(ServiceError::UnsupportedFormat(format!(
                "{} (expected csv, txt, xls or xlsx)",
                path.display()
            ))),
        }
    }
}

/// Infer the value of one text cell: empty, integer, float, boolean, else text
pub fn infer_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Value::Float(v);
    }
    match cell {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::Text(cell.to_string()),
    }
}

/// Parse UTF-8 delimited text with a header row.
///
/// Rows shorter than the header are padded with nulls; longer rows are a
/// parse error.
pub fn parse_delimited<R: Read>(reader: R) -> ServiceResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(columns);

    for record in reader.records() {
        let record = record?;
        if record.len() > table.column_count() {
            return Err(ServiceError::Parse {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                message: format!(
                    "found {} fields, header has {}",
                    record.len(),
                    table.column_count()
                ),
            });
        }
        let mut row: Vec<Value> = record.iter().map(infer_value).collect();
        row.resize(table.column_count(), Value::Null);
        table.push_row(row);
    }

    Ok(table)
}

/// Largest integer an `f64` cell holds exactly
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Map one workbook cell the way [`infer_value`] maps a text cell.
///
/// Workbooks store every number as a float; whole numbers become integers.
pub fn spreadsheet_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(v) => Value::Int(*v),
        Data::Float(v) if v.fract() == 0.0 && v.abs() <= MAX_EXACT_FLOAT_INT => {
            Value::Int(*v as i64)
        }
        Data::Float(v) => Value::Float(*v),
        Data::Bool(v) => Value::Bool(*v),
        Data::String(v) => infer_value(v),
        Data::DateTime(v) => v
            .as_datetime()
            .map(Value::Timestamp)
            .unwrap_or(Value::Float(v.as_f64())),
        Data::DateTimeIso(v) | Data::DurationIso(v) => Value::Text(v.clone()),
    }
}

/// Read the first sheet of an `.xls`/`.xlsx` workbook; its first row is the header
pub fn read_spreadsheet(path: &Path) -> ServiceResult<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        ServiceError::Spreadsheet(format!("{} has no sheets", path.display()))
    })??;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("COLUMN_{}", i + 1),
                other => other.to_string(),
            })
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(spreadsheet_value).collect());
    }
    Ok(table)
}

/// Read a file into a table according to its extension
pub fn read_table(path: &Path) -> ServiceResult<Table> {
    match FileFormat::from_path(path)? {
        FileFormat::Delimited => parse_delimited(std::fs::File::open(path)?),
        FileFormat::Spreadsheet => read_spreadsheet(path),
    }
}

/// Service for loading files into tables of one database and schema
pub struct UploadService {
    loader: Arc<dyn TableLoader>,
    database: String,
    schema: String,
}

impl UploadService {
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

    /// Read `path` into a table
    pub fn load_file(&self, path: &Path) -> ServiceResult<Table> {
        let table = read_table(path)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded file"
        );
        Ok(table)
    }

    /// First `n` rows of `table`
    pub fn preview(&self, table: &Table, n: usize) -> Table {
        table.head(n)
    }

    /// Write `table` into `table_name`, creating the table if needed.
    /// Returns the number of rows written.
    #[tracing::instrument(skip(self, table), fields(rows = table.row_count()))]
    pub async fn upload(&self, table: &Table, table_name: &str) -> ServiceResult<u64> {
        let target = TableTarget::new(&self.database, &self.schema, table_name)?;
        let written = self.loader.write_table(table, &target, true).await?;
        tracing::info!(table = %target, rows = written, "upload finished");
        Ok(written)
    }

    /// Read `path` and upload it into `table_name`
    pub async fn upload_file(&self, path: &Path, table_name: &str) -> ServiceResult<u64> {
        // Reject a blank name before reading the file
        TableTarget::new(&self.database, &self.schema, table_name)?;
        let table = self.load_file(path)?;
        self.upload(&table, table_name).await
    }
}
