use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::salary::net_pay::{self, GrossFromNetInput, SalaryInput};

use crate::{config, input};

/// Arguments for the take-home pay calculation
#[derive(Args)]
pub struct SalaryArgs {
    /// Gross monthly salary
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// Year-end bonus in months of salary
    #[arg(long, default_value = "0")]
    pub bonus_months: Decimal,

    /// Health-insurance dependents
    #[arg(long, default_value_t = 0)]
    pub dependents: u32,

    /// Voluntary pension contribution in percent (0-6)
    #[arg(long, default_value = "0")]
    pub self_contribution: Decimal,

    /// Filing jointly with a spouse
    #[arg(long)]
    pub married: bool,

    /// Payroll tables (YAML or JSON); defaults to $FINCALC_SALARY_TABLES
    #[arg(long)]
    pub salary_tables: Option<String>,

    /// Tax-year tables for the annual income tax; defaults to $FINCALC_TABLES
    #[arg(long)]
    pub tables: Option<String>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the gross-from-net search
#[derive(Args)]
pub struct GrossFromNetArgs {
    /// Monthly take-home pay to reach
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Health-insurance dependents
    #[arg(long, default_value_t = 0)]
    pub dependents: u32,

    /// Voluntary pension contribution in percent (0-6)
    #[arg(long, default_value = "0")]
    pub self_contribution: Decimal,

    /// Payroll tables (YAML or JSON); defaults to $FINCALC_SALARY_TABLES
    #[arg(long)]
    pub salary_tables: Option<String>,
}

pub fn run_salary(args: SalaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let files = config::TableFiles {
        tax: args.tables.as_deref(),
        salary: args.salary_tables.as_deref(),
    };
    let salary_input: SalaryInput = match input::read_input::<Value>(args.input.as_deref())? {
        Some(mut params) => {
            config::inject_tables("salary.netPay", &mut params, &files)?;
            serde_json::from_value(params)?
        }
        None => SalaryInput {
            monthly_salary: args.monthly.ok_or("--monthly is required (or provide --input)")?,
            bonus_months: args.bonus_months,
            dependents: args.dependents,
            self_contribution_rate_pct: args.self_contribution,
            is_married: args.married,
            tables: config::load_salary_tables(files.salary)?,
            tax_tables: if config::tables_configured(files.tax) {
                Some(config::load_tables(files.tax)?)
            } else {
                None
            },
        },
    };
    let result = net_pay::calculate_net_pay(&salary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_gross_from_net(args: GrossFromNetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let search = GrossFromNetInput {
        target_take_home: args.target.ok_or("--target is required")?,
        dependents: args.dependents,
        self_contribution_rate_pct: args.self_contribution,
        tables: config::load_salary_tables(args.salary_tables.as_deref())?,
    };
    let result = net_pay::gross_from_net(&search)?;
    Ok(serde_json::to_value(result)?)
}
