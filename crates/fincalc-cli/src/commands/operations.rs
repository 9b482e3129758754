use clap::Args;
use serde_json::{json, Value};

use fincalc_core::operations::{describe, invoke, list_operations};

use crate::{config, input};

/// Arguments for invoking a named operation
#[derive(Args)]
pub struct InvokeArgs {
    /// Operation id (see `fincalc operations`)
    pub operation: String,

    /// Path to JSON/YAML file with the parameters (or pipe them on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Tax-year tables for tax operations; defaults to $FINCALC_TABLES
    #[arg(long)]
    pub tables: Option<String>,

    /// Payroll tables for salary operations; defaults to $FINCALC_SALARY_TABLES
    #[arg(long)]
    pub salary_tables: Option<String>,
}

/// Arguments for listing operations
#[derive(Args)]
pub struct OperationsArgs {
    /// Show only this operation, with its full parameter schema
    pub operation: Option<String>,
}

pub fn run_invoke(args: InvokeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut params: Value = input::read_input(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for invoke")?;
    let files = config::TableFiles {
        tax: args.tables.as_deref(),
        salary: args.salary_tables.as_deref(),
    };
    config::inject_tables(&args.operation, &mut params, &files)?;
    Ok(invoke(&args.operation, params)?)
}

pub fn run_operations(args: OperationsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(id) = args.operation {
        return Ok(serde_json::to_value(describe(&id)?)?);
    }
    let summary: Vec<Value> = list_operations()
        .into_iter()
        .map(|op| {
            json!({
                "id": op.id,
                "description": op.description,
                "required": op.parameters.required,
            })
        })
        .collect();
    Ok(Value::Array(summary))
}
