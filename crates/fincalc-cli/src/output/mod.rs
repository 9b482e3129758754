pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Result fields that hold one row per month, year or sweep value.
const ROW_KEYS: [&str; 3] = ["schedule", "yearly", "rows"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(out));
    if let Err(e) = written {
        eprintln!("JSON output error: {}", e);
    }
}

/// The `result` object of a computation envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

type Rows<'a> = Option<(&'a str, Vec<Map<String, Value>>)>;

/// Split an object into its scalar fields and its first row array.
pub(crate) fn split_rows(map: &Map<String, Value>) -> (Vec<(&str, &Value)>, Rows<'_>) {
    let mut fields = Vec::new();
    let mut rows = None;
    for (key, val) in map {
        match val {
            Value::Array(arr) if rows.is_none() && ROW_KEYS.contains(&key.as_str()) => {
                rows = Some((key.as_str(), flatten_rows(arr)));
            }
            _ => fields.push((key.as_str(), val)),
        }
    }
    (fields, rows)
}

/// Flatten row objects so nested records become prefixed columns.
///
/// Sweep rows carry a whole computation envelope; only its result is kept.
fn flatten_rows(arr: &[Value]) -> Vec<Map<String, Value>> {
    arr.iter()
        .filter_map(Value::as_object)
        .map(|row| {
            let mut flat = Map::new();
            for (key, val) in row {
                match val {
                    Value::Object(_) if key == "result" => {
                        flatten_into(&mut flat, "", result_of(val));
                    }
                    Value::Object(_) => flatten_into(&mut flat, &format!("{key}."), val),
                    _ => {
                        flat.insert(key.clone(), val.clone());
                    }
                }
            }
            flat
        })
        .collect()
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: &str, value: &Value) {
    if let Value::Object(map) = value {
        for (key, val) in map {
            match val {
                Value::Object(_) => flatten_into(flat, &format!("{prefix}{key}."), val),
                // Nested schedules are too wide for one row.
                Value::Array(_) => {}
                _ => {
                    flat.insert(format!("{prefix}{key}"), val.clone());
                }
            }
        }
    }
}

/// Union of row keys in first-seen order.
pub(crate) fn row_headers(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

pub(crate) fn scalar_text(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_rows_finds_schedule() {
        let value = json!({
            "monthly_payment": "37717",
            "schedule": [{"month": 1, "balance": "100"}],
        });
        let (fields, rows) = split_rows(value.as_object().unwrap());
        assert_eq!(fields.len(), 1);
        let (key, rows) = rows.unwrap();
        assert_eq!(key, "schedule");
        assert_eq!(rows[0]["month"], json!(1));
    }

    #[test]
    fn test_sweep_rows_flatten_envelope_result() {
        let value = json!({
            "parameter_name": "annual_rate_pct",
            "rows": [{
                "index": 0,
                "value": "2",
                "result": {
                    "result": {"monthly_payment": "25294", "schedule": []},
                    "warnings": []
                }
            }],
            "baseline_index": null
        });
        let (_, rows) = split_rows(value.as_object().unwrap());
        let (_, rows) = rows.unwrap();
        assert_eq!(
            row_headers(&rows),
            vec!["index".to_string(), "monthly_payment".to_string(), "value".to_string()]
        );
    }

    #[test]
    fn test_nested_outcomes_are_prefixed() {
        let value = json!({
            "rows": [{"value": "1", "result": {"result": {"shorten_term": {"months_saved": 56}}}}]
        });
        let (_, rows) = split_rows(value.as_object().unwrap());
        let (_, rows) = rows.unwrap();
        assert_eq!(rows[0]["shorten_term.months_saved"], json!(56));
    }
}
