use serde_json::Value;

use super::{format_value, investor_rows, result_object};

/// Print just the key answer: `investor call_amount` per line for calls,
/// otherwise the first well-known total in the result.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(value) {
        println!("{}", line);
    }
}

fn minimal_lines(value: &Value) -> Vec<String> {
    if let Some((rows, _)) = investor_rows(value) {
        let lines: Vec<String> = rows
            .iter()
            .filter_map(|r| r.as_object())
            .filter_map(|m| {
                let id = m.get("investor_id").or_else(|| m.get("id"))?;
                let amount = m.get("call_amount").or_else(|| m.get("commitment"))?;
                Some(format!("{}\t{}", format_value(id), format_value(amount)))
            })
            .collect();
        if !lines.is_empty() {
            return lines;
        }
    }

    let priority_keys = ["total_allocated", "total_call_amount", "unallocated"];
    let Some(map) = result_object(value) else {
        return vec![format_value(value)];
    };

    for key in &priority_keys {
        if let Some(val) = map.get(*key) {
            if !val.is_null() {
                return vec![format_value(val)];
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => vec![format!("{}: {}", key, format_value(val))],
        None => Vec::new(),
    }
}
