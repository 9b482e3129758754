use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::operations::invoke;
use fincalc_core::tax::deductions::DeductionInput;
use fincalc_core::tax::income_tax::{self, IncomeTaxInput};

use crate::{config, input};

/// Household facts shared by the tax and deductions commands
#[derive(Args)]
pub struct HouseholdArgs {
    /// Annual gross income
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Salary part of gross income (defaults to all of it)
    #[arg(long)]
    pub salary_income: Option<Decimal>,

    /// Filing jointly with a spouse
    #[arg(long)]
    pub married: bool,

    /// Dependents younger than 70
    #[arg(long, default_value_t = 0)]
    pub dependents_under_70: u32,

    /// Dependents aged 70 or over
    #[arg(long, default_value_t = 0)]
    pub dependents_over_70: u32,

    /// Itemized deductions (used when above the standard deduction)
    #[arg(long)]
    pub itemized: Option<Decimal>,
}

impl HouseholdArgs {
    fn to_input(&self) -> Result<DeductionInput, Box<dyn std::error::Error>> {
        Ok(DeductionInput {
            gross_income: self
                .gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            salary_income: self.salary_income,
            is_married: self.married,
            dependents_under_70: self.dependents_under_70,
            dependents_over_70: self.dependents_over_70,
            itemized_deductions: self.itemized,
        })
    }
}

/// Arguments for income tax calculation
#[derive(Args)]
pub struct TaxArgs {
    #[command(flatten)]
    pub household: HouseholdArgs,

    /// Tax-year tables (YAML or JSON); defaults to $FINCALC_TABLES
    #[arg(long)]
    pub tables: Option<String>,

    /// Path to JSON/YAML file with the household (and optionally the tables)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the deduction breakdown
#[derive(Args)]
pub struct DeductionsArgs {
    #[command(flatten)]
    pub household: HouseholdArgs,

    /// Tax-year tables (YAML or JSON); defaults to $FINCALC_TABLES
    #[arg(long)]
    pub tables: Option<String>,
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: IncomeTaxInput = match input::read_input::<Value>(args.input.as_deref())? {
        Some(mut params) => {
            if params.get("household").is_none() {
                // A bare household record.
                params = serde_json::json!({ "household": params });
            }
            let files = config::TableFiles {
                tax: args.tables.as_deref(),
                ..Default::default()
            };
            config::inject_tables("tax.calculate", &mut params, &files)?;
            serde_json::from_value(params)?
        }
        None => IncomeTaxInput {
            household: args.household.to_input()?,
            tables: config::load_tables(args.tables.as_deref())?,
        },
    };
    let result = income_tax::calculate_income_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_deductions(args: DeductionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = config::load_tables(args.tables.as_deref())?;
    let params = serde_json::json!({
        "household": args.household.to_input()?,
        "table": tables.deductions,
    });
    Ok(invoke("tax.deductions", params)?)
}
