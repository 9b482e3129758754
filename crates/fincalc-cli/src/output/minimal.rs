use serde_json::Value;

use super::{result_of, scalar_text};

/// Headline field of each operation, in priority order.
const HEADLINE_KEYS: [&str; 9] = [
    "monthly_payment",
    "tax",
    "net_savings",
    "months",
    "final_nominal_value",
    "total_deductions",
    "new_monthly_payment",
    "original_monthly",
    "parameter_name",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = result_of(value);

    if let Value::Object(map) = result {
        if let Some(val) = HEADLINE_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|val| !val.is_null())
        {
            return scalar_text(val, "null");
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar_text(val, "null"));
        }
    }
    scalar_text(result, "null")
}
