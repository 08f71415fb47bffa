// crates/strata-cli/src/output.rs
//
// Output formatting utilities for the Strata CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print rows in the requested format, or `empty` if there are none.
pub fn print_rows<T: Tabled + Serialize>(format: OutputFormat, rows: &[T], empty: &str) {
    match format {
        OutputFormat::Json => println!("{}", format_json(&rows)),
        OutputFormat::Table if rows.is_empty() => println!("{}", empty),
        OutputFormat::Table => println!("{}", format_table(rows)),
    }
}
