//! Inspect command implementation.

use crmlink_table::{load, TabularData};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Table inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File path.
    pub path: String,
    /// Table name, if any.
    pub name: Option<String>,
    /// Number of rows.
    pub row_count: usize,
    /// Per-column statistics, in first-seen order.
    pub columns: Vec<ColumnStats>,
}

/// Statistics for a single column.
#[derive(Debug, Serialize, PartialEq)]
pub struct ColumnStats {
    /// Column name.
    pub name: String,
    /// Rows holding a non-null value.
    pub filled: usize,
    /// Value types seen.
    pub types: Vec<String>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(path)?;
    let result = analyze(path, &table);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Computes statistics for a loaded table.
pub fn analyze(path: &Path, table: &TabularData) -> InspectResult {
    let columns = table
        .columns()
        .into_iter()
        .map(|name| {
            let values: Vec<_> = table
                .rows()
                .iter()
                .filter_map(|row| row.get(&name))
                .filter(|value| !value.is_null())
                .collect();
            let types: BTreeSet<_> = values.iter().map(|v| v.type_name().to_string()).collect();
            ColumnStats {
                name,
                filled: values.len(),
                types: types.into_iter().collect(),
            }
        })
        .collect();

    InspectResult {
        path: path.display().to_string(),
        name: table.name().map(str::to_string),
        row_count: table.len(),
        columns,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Table: {}", result.path);
    println!("  Name: {}", result.name.as_deref().unwrap_or("(none)"));
    println!("  Rows: {}", result.row_count);
    println!("  Columns: {}", result.columns.len());
    for column in &result.columns {
        println!(
            "    {:<30} {:>6} filled  [{}]",
            column.name,
            column.filled,
            column.types.join(", ")
        );
    }
}
