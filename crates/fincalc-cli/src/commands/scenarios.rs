use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::operations::invoke;

use crate::{config, input};

/// Arguments for a one-axis scenario sweep
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SweepArgs {
    /// Operation to run for each value (e.g. mortgage.calculate)
    #[arg(long)]
    pub operation: String,

    /// Parameter to vary, as a dotted path (e.g. household.dependents_under_70)
    #[arg(long)]
    pub param: String,

    /// Comma-separated values (e.g. "1.5,2,2.5")
    #[arg(long, conflicts_with = "range")]
    pub values: Option<String>,

    /// Value range in format min:max:step (e.g. "1.5:3.0:0.25")
    #[arg(long)]
    pub range: Option<String>,

    /// Value of the unmodified case, reported as the baseline row
    #[arg(long)]
    pub baseline: Option<Decimal>,

    /// Path to JSON/YAML file with the base parameters (or pipe them on stdin)
    #[arg(long)]
    pub base_inputs: Option<String>,

    /// Tax-year tables for tax operations; defaults to $FINCALC_TABLES
    #[arg(long)]
    pub tables: Option<String>,

    /// Payroll tables for salary operations; defaults to $FINCALC_SALARY_TABLES
    #[arg(long)]
    pub salary_tables: Option<String>,
}

fn parse_values(list: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Decimal>()
                .map_err(|e| format!("Invalid sweep value '{}': {}", s, e).into())
        })
        .collect()
}

fn parse_range(range: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = range.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Range must be min:max:step, got '{}'", range).into());
    }
    let min: Decimal = parts[0].trim().parse()?;
    let max: Decimal = parts[1].trim().parse()?;
    let step: Decimal = parts[2].trim().parse()?;
    if step <= Decimal::ZERO {
        return Err("Range step must be positive".into());
    }
    if min > max {
        return Err("Range min must be <= max".into());
    }

    let mut values = Vec::new();
    let mut current = min;
    while current <= max {
        values.push(current);
        current += step;
    }
    // Include max when the step doesn't land on it
    if values.last().is_some_and(|&last| last < max) {
        values.push(max);
    }
    Ok(values)
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let values = match (&args.values, &args.range) {
        (Some(list), _) => parse_values(list)?,
        (None, Some(range)) => parse_range(range)?,
        (None, None) => return Err("--values or --range is required".into()),
    };

    let mut base: Value = input::read_input(args.base_inputs.as_deref())?
        .ok_or("--base-inputs <file> or stdin required for a sweep")?;
    let files = config::TableFiles {
        tax: args.tables.as_deref(),
        salary: args.salary_tables.as_deref(),
    };
    config::inject_tables(&args.operation, &mut base, &files)?;

    let mut axis = json!({
        "parameter_name": args.param,
        "values": values,
    });
    if let Some(baseline) = args.baseline {
        axis["baseline"] = json!(baseline);
    }

    let params = json!({
        "operation": args.operation,
        "base": base,
        "axis": axis,
    });
    Ok(invoke("scenario.sweep", params)?)
}
