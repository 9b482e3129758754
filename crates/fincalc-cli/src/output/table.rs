use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{row_headers, scalar_text, split_rows};

/// Format output as tables: scalar fields first, then any row array.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(envelope) => {
            match envelope.get("result") {
                Some(Value::Object(result)) => print_object(result),
                _ => print_object(envelope),
            }
            print_notes(envelope);
        }
        Value::Array(arr) => {
            let rows: Vec<Map<String, Value>> =
                arr.iter().filter_map(Value::as_object).cloned().collect();
            print_rows(&rows);
        }
        _ => println!("{}", value),
    }
}

fn print_object(map: &Map<String, Value>) {
    let (fields, rows) = split_rows(map);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.to_string(), format_cell(val)]);
    }
    println!("{}", Table::from(builder));

    if let Some((key, rows)) = rows {
        println!("\n{}:", key);
        print_rows(&rows);
    }
}

fn print_rows(rows: &[Map<String, Value>]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    let headers = row_headers(rows);
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(h).map(format_cell).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, format_cell(v)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => scalar_text(value, "-"),
    }
}
