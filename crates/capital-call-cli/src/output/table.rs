use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_value, investor_rows, result_object};

/// Format output as tables: one row per investor, then the scalar and
/// nested sections of the result (summary, levels, totals).
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", value);
        return;
    };

    if let Some((rows, columns)) = investor_rows(value) {
        print_rows(rows, columns);
    }

    let mut scalars = Builder::default();
    scalars.push_record(["Field", "Value"]);
    let mut has_scalars = false;
    for (key, val) in result {
        match val {
            Value::Object(section) => print_section(key, section),
            Value::Array(_) if key == "allocations" || key == "investors" => {}
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                println!("\n{}:", key);
                print_rows(items, &[]);
            }
            _ => {
                scalars.push_record([key.as_str(), &format_value(val)]);
                has_scalars = true;
            }
        }
    }
    if has_scalars {
        println!("\n{}", Table::from(scalars));
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_rows(rows: &[Value], columns: &[&str]) {
    if rows.is_empty() {
        println!("(no investors)");
        return;
    }

    // Without a fixed column list, take the keys of the first row.
    let headers: Vec<String> = if columns.is_empty() {
        match rows.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            _ => return,
        }
    } else {
        columns.iter().map(|c| c.to_string()).collect()
    };

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_section(name: &str, section: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record([name, ""]);
    for (key, val) in section {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("\n{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
