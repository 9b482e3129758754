use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use fincalc_core::growth::capital::{self, CapitalGrowthInput};
use fincalc_core::growth::goals::{self, FireInput, GoalReverseInput};

use crate::input;

/// Arguments for a capital growth projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct GrowthArgs {
    /// Starting capital
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Amount added every month
    #[arg(long, default_value = "0")]
    pub monthly: Decimal,

    /// Expected annual return in percent (e.g. 6)
    #[arg(long)]
    pub annual_return: Option<Decimal>,

    /// Annual inflation in percent
    #[arg(long, default_value = "0")]
    pub inflation: Decimal,

    /// Projection horizon in years
    #[arg(long, default_value_t = 20)]
    pub years: u32,

    /// Return offset for the optimistic and pessimistic paths (default 2)
    #[arg(long)]
    pub spread: Option<Decimal>,

    /// Annual withdrawal rate for the passive-income estimate (default 4)
    #[arg(long)]
    pub withdrawal_rate: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the FIRE calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FireArgs {
    /// Monthly living expense
    #[arg(long)]
    pub expense: Option<Decimal>,

    /// Savings today
    #[arg(long, default_value = "0")]
    pub savings: Decimal,

    /// Amount invested every month
    #[arg(long, default_value = "0")]
    pub monthly: Decimal,

    /// Expected annual return in percent
    #[arg(long, default_value = "7")]
    pub annual_return: Decimal,

    /// Safe withdrawal rate in percent
    #[arg(long, default_value = "4")]
    pub withdrawal_rate: Decimal,

    /// Annual inflation in percent
    #[arg(long, default_value = "2.5")]
    pub inflation: Decimal,

    /// Horizon for the monthly investment needed
    #[arg(long, default_value_t = 20)]
    pub target_years: u32,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the monthly investment needed to reach a goal
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct GoalArgs {
    /// Amount to reach
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Years to reach it
    #[arg(long)]
    pub years: Option<u32>,

    /// Expected annual return in percent
    #[arg(long, default_value = "7")]
    pub annual_return: Decimal,

    /// Capital invested today
    #[arg(long, default_value = "0")]
    pub initial: Decimal,
}

pub fn run_growth(args: GrowthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let growth_input: CapitalGrowthInput = match input::read_input(args.input.as_deref())? {
        Some(growth_input) => growth_input,
        None => CapitalGrowthInput {
            initial_capital: args.initial.ok_or("--initial is required (or provide --input)")?,
            monthly_contribution: args.monthly,
            annual_return_pct: args
                .annual_return
                .ok_or("--annual-return is required (or provide --input)")?,
            inflation_rate_pct: args.inflation,
            years: args.years,
            sensitivity_spread_pct: args.spread.unwrap_or(dec!(2)),
            withdrawal_rate_pct: args.withdrawal_rate.unwrap_or(dec!(4)),
        },
    };
    let result = capital::project_capital_growth(&growth_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fire(args: FireArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fire_input: FireInput = match input::read_input(args.input.as_deref())? {
        Some(fire_input) => fire_input,
        None => FireInput {
            monthly_expense: args.expense.ok_or("--expense is required (or provide --input)")?,
            current_savings: args.savings,
            monthly_investment: args.monthly,
            expected_return_pct: args.annual_return,
            safe_withdrawal_rate_pct: args.withdrawal_rate,
            inflation_rate_pct: args.inflation,
            target_years: args.target_years,
        },
    };
    let result = goals::calculate_fire(&fire_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_goal(args: GoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal = GoalReverseInput {
        target_amount: args.target.ok_or("--target is required")?,
        years: args.years.ok_or("--years is required")?,
        expected_return_pct: args.annual_return,
        initial_capital: args.initial,
    };
    let result = goals::calculate_goal_reverse(&goal)?;
    Ok(serde_json::to_value(result)?)
}
