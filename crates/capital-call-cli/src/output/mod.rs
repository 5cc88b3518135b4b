pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Columns shown for each investor row in table and CSV output.
pub const ALLOCATION_COLUMNS: [&str; 8] = [
    "investor_id",
    "investor_name",
    "hierarchy_level",
    "commitment",
    "ownership_percent",
    "call_amount",
    "called_after_call",
    "uncalled_capital",
];

/// Columns shown for resolved investors (no call amounts yet).
pub const INVESTOR_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "hierarchy_level",
    "structure_name",
    "commitment",
    "called_to_date",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The `result` object of a computation envelope, or the value itself.
pub fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
        .as_object()
}

/// Per-investor rows and the columns to show for them: call allocations
/// if present, otherwise resolved investors.
pub fn investor_rows(value: &Value) -> Option<(&[Value], &'static [&'static str])> {
    let result = result_object(value)?;
    if let Some(Value::Array(rows)) = result.get("allocations") {
        return Some((rows.as_slice(), &ALLOCATION_COLUMNS));
    }
    if let Some(Value::Array(rows)) = result.get("investors") {
        return Some((rows.as_slice(), &INVESTOR_COLUMNS));
    }
    None
}

/// Render a JSON value as a single cell.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
