use serde_json::{Map, Value};
use std::io;

use super::{result_of, row_headers, scalar_text, split_rows};

/// Write output as CSV to stdout.
///
/// A result with a row array (schedule, yearly projection, sweep) is written
/// as that table; anything else as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_csv(&mut wtr, value) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match result_of(value) {
        Value::Object(map) => match split_rows(map) {
            (_, Some((_, rows))) => write_rows(wtr, &rows)?,
            (fields, None) => {
                wtr.write_record(["field", "value"])?;
                for (key, val) in fields {
                    wtr.write_record([key, scalar_text(val, "").as_str()])?;
                }
            }
        },
        Value::Array(arr) => {
            let rows: Vec<Map<String, Value>> =
                arr.iter().filter_map(Value::as_object).cloned().collect();
            write_rows(wtr, &rows)?;
        }
        other => wtr.write_record([scalar_text(other, "")])?,
    }
    wtr.flush()?;
    Ok(())
}

fn write_rows<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    rows: &[Map<String, Value>],
) -> csv::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let headers = row_headers(rows);
    wtr.write_record(&headers)?;
    for row in rows {
        wtr.write_record(
            headers
                .iter()
                .map(|h| row.get(h).map(|v| scalar_text(v, "")).unwrap_or_default()),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, value).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_yearly_projection_as_table() {
        let out = json!({
            "result": {
                "final_nominal_value": "1126825",
                "yearly": [
                    {"year": 0, "nominal_value": "1000000"},
                    {"year": 1, "nominal_value": "1126825"}
                ]
            }
        });
        assert_eq!(render(&out), "nominal_value,year\n1000000,0\n1126825,1\n");
    }

    #[test]
    fn test_flat_result_as_field_value() {
        let out = json!({"result": {"months": 121, "years": "10.08"}});
        assert_eq!(render(&out), "field,value\nmonths,121\nyears,10.08\n");
    }
}
