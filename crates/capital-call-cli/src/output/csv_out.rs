use serde_json::Value;
use std::io::{self, Write};

use super::{format_value, investor_rows, result_object};

/// Write output as CSV to stdout: one record per investor when the result
/// carries investors, otherwise `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let _ = write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    if let Some((rows, columns)) = investor_rows(value) {
        wtr.write_record(columns)?;
        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = columns
                    .iter()
                    .map(|c| map.get(*c).map(format_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
        return Ok(());
    }

    wtr.write_record(["field", "value"])?;
    match result_object(value) {
        Some(map) => {
            for (key, val) in map {
                wtr.write_record([key.as_str(), &format_value(val)])?;
            }
        }
        None => wtr.write_record(["value", &format_value(value)])?,
    }
    Ok(())
}
