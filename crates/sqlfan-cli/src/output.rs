//! Terminal rendering of results

use comfy_table::{Cell, Table as TextTable};
use sqlfan_core::{Row, Table, Value};
use sqlfan_query::{ExecutionResult, Outcome};
use sqlfan_services::ExecutionSummary;

/// Statement text longer than this is cut in result headings
const STATEMENT_PREVIEW_CHARS: usize = 80;

fn cell(value: &Value) -> Cell {
    Cell::new(value)
}

fn statement_preview(statement: &str) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > STATEMENT_PREVIEW_CHARS {
        let cut: String = flat.chars().take(STATEMENT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn rows_table(rows: &[Row]) -> TextTable {
    let mut table = TextTable::new();
    if let Some(first) = rows.first() {
        table.set_header(first.columns());
    }
    for row in rows {
        table.add_row(row.values.iter().map(cell).collect::<Vec<_>>());
    }
    table
}

/// Heading line plus a table of rows, or the error message
pub fn render_result(result: &ExecutionResult) -> String {
    let heading = format!(
        "[{}] {} ({:.3}s)",
        result.index + 1,
        statement_preview(&result.statement),
        result.elapsed.as_secs_f64()
    );

    let body = match &result.outcome {
        Outcome::Success { rows } if rows.is_empty() => "(no rows)".to_string(),
        Outcome::Success { rows } => rows_table(rows).to_string(),
        Outcome::Failure { message } => format!("Error: {}", message),
    };

    format!("{}\n{}", heading, body)
}

pub fn render_summary(summary: &ExecutionSummary) -> String {
    format!(
        "{} statement(s): {} succeeded, {} failed in {:.3}s",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.elapsed.as_secs_f64()
    )
}

pub fn render_table(table: &Table) -> String {
    let mut text = TextTable::new();
    text.set_header(&table.columns);
    for row in &table.rows {
        text.add_row(row.iter().map(cell).collect::<Vec<_>>());
    }
    text.to_string()
}
