//! Tax-year and payroll table loading.
//!
//! Tax tables come from `--tables <file>` or, failing that, the file named
//! by `FINCALC_TABLES`; payroll tables from `--salary-tables <file>` or
//! `FINCALC_SALARY_TABLES`. Both YAML and JSON are accepted.

use fincalc_core::salary::SalaryTables;
use fincalc_core::tax::income_tax::TaxYearTables;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::input;

const TABLES_ENV: &str = "FINCALC_TABLES";
const SALARY_TABLES_ENV: &str = "FINCALC_SALARY_TABLES";

/// Table files named on the command line; unset ones fall back to the
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFiles<'a> {
    pub tax: Option<&'a str>,
    pub salary: Option<&'a str>,
}

fn configured(flag: Option<&str>, env: &str) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(env).ok().filter(|p| !p.trim().is_empty()))
}

fn load<T: DeserializeOwned>(
    flag: Option<&str>,
    env: &str,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let path = configured(flag, env)
        .ok_or_else(|| format!("--{what} <file> (or {env}) is required for this calculation"))?;
    debug!(path = %path, kind = what, "loading tables");
    input::file::read_structured(&path)
}

/// Whether tax tables were named on the command line or in the environment.
pub fn tables_configured(flag: Option<&str>) -> bool {
    configured(flag, TABLES_ENV).is_some()
}

pub fn load_tables(flag: Option<&str>) -> Result<TaxYearTables, Box<dyn std::error::Error>> {
    load(flag, TABLES_ENV, "tables")
}

pub fn load_salary_tables(flag: Option<&str>) -> Result<SalaryTables, Box<dyn std::error::Error>> {
    load(flag, SALARY_TABLES_ENV, "salary-tables")
}

/// Fill in the tables an operation needs when its parameters omit them.
///
/// `tax.calculate` takes the whole tax year as `tables`; `tax.deductions`
/// takes only the deduction amounts as `table`. Salary operations take the
/// payroll tables as `tables`, and `salary.netPay` the tax year as
/// `tax_tables`. Parameters that already carry tables win over the files,
/// and nothing is added when no file is configured.
pub fn inject_tables(
    operation: &str,
    params: &mut Value,
    files: &TableFiles<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(map) = params.as_object_mut() else {
        return Ok(());
    };
    let missing = |key: &str, flag: Option<&str>, env: &str| {
        !map.contains_key(key) && configured(flag, env).is_some()
    };

    let mut additions: Vec<(&str, Value)> = Vec::new();
    match operation {
        "tax.calculate" => {
            if missing("tables", files.tax, TABLES_ENV) {
                additions.push(("tables", serde_json::to_value(load_tables(files.tax)?)?));
            }
        }
        "tax.deductions" => {
            if missing("table", files.tax, TABLES_ENV) {
                let tables = load_tables(files.tax)?;
                additions.push(("table", serde_json::to_value(&tables.deductions)?));
            }
        }
        "salary.netPay" | "salary.grossFromNet" => {
            if missing("tables", files.salary, SALARY_TABLES_ENV) {
                let tables = load_salary_tables(files.salary)?;
                additions.push(("tables", serde_json::to_value(tables)?));
            }
            if operation == "salary.netPay" && missing("tax_tables", files.tax, TABLES_ENV) {
                additions.push(("tax_tables", serde_json::to_value(load_tables(files.tax)?)?));
            }
        }
        _ => {}
    }
    for (key, value) in additions {
        map.insert(key.to_string(), value);
    }
    Ok(())
}
