use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::mortgage::amortization::{self, LoanParameters};
use fincalc_core::mortgage::early_repayment::{
    self, EarlyRepaymentInput, ExtraPaymentMode, RepaymentStrategy,
};
use fincalc_core::mortgage::refinance::{self, RefinanceInput};
use fincalc_core::operations::invoke;

use crate::input;

/// Arguments for a loan calculation
#[derive(Args)]
pub struct MortgageArgs {
    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 2.15)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Interest-only years at the start of the term
    #[arg(long, default_value = "0")]
    pub grace_years: Decimal,

    /// Include the month-by-month schedule
    #[arg(long)]
    pub schedule: bool,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ModeArg {
    LumpSum,
    Recurring,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum StrategyArg {
    ShortenTerm,
    ReducePayment,
}

/// Arguments for early repayment analysis
#[derive(Args)]
pub struct EarlyRepaymentArgs {
    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Years left on the loan
    #[arg(long)]
    pub remaining_years: Option<Decimal>,

    /// Extra amount paid
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Pay the extra amount once or every month
    #[arg(long, value_enum, default_value = "lump-sum")]
    pub mode: ModeArg,

    /// Evaluate a single strategy (both by default)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for refinance evaluation
#[derive(Args)]
pub struct RefinanceArgs {
    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Current annual rate in percent
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    /// Years left on the current loan
    #[arg(long)]
    pub remaining_years: Option<Decimal>,

    /// Annual rate of the new loan in percent
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// Term of the new loan (defaults to the remaining term)
    #[arg(long)]
    pub new_years: Option<Decimal>,

    /// One-off switching cost
    #[arg(long, default_value = "30000")]
    pub cost: Decimal,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the payoff term solver
#[derive(Args)]
pub struct PayoffArgs {
    /// Balance to repay
    #[arg(long)]
    pub balance: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Decimal,

    /// Fixed monthly payment
    #[arg(long)]
    pub payment: Decimal,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParameters = match input::read_input(args.input.as_deref())? {
        Some(loan) => loan,
        None => LoanParameters {
            principal: args.principal.ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
            grace_period_years: args.grace_years,
            include_schedule: args.schedule,
        },
    };
    let result = amortization::calculate_mortgage(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_early_repayment(args: EarlyRepaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let er_input: EarlyRepaymentInput = match input::read_input(args.input.as_deref())? {
        Some(er_input) => er_input,
        None => EarlyRepaymentInput {
            current_balance: args.balance.ok_or("--balance is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            remaining_years: args
                .remaining_years
                .ok_or("--remaining-years is required (or provide --input)")?,
            extra_payment: args.extra.ok_or("--extra is required (or provide --input)")?,
            mode: match args.mode {
                ModeArg::LumpSum => ExtraPaymentMode::LumpSum,
                ModeArg::Recurring => ExtraPaymentMode::RecurringMonthly,
            },
            strategy: args.strategy.map(|s| match s {
                StrategyArg::ShortenTerm => RepaymentStrategy::ShortenTerm,
                StrategyArg::ReducePayment => RepaymentStrategy::ReducePayment,
            }),
        },
    };
    let result = early_repayment::analyze_early_repayment(&er_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refi_input: RefinanceInput = match input::read_input(args.input.as_deref())? {
        Some(refi_input) => refi_input,
        None => RefinanceInput {
            current_balance: args.balance.ok_or("--balance is required (or provide --input)")?,
            current_rate_pct: args
                .current_rate
                .ok_or("--current-rate is required (or provide --input)")?,
            remaining_years: args
                .remaining_years
                .ok_or("--remaining-years is required (or provide --input)")?,
            new_rate_pct: args.new_rate.ok_or("--new-rate is required (or provide --input)")?,
            new_years: args.new_years,
            refinance_cost: args.cost,
        },
    };
    let result = refinance::evaluate_refinance(&refi_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = serde_json::json!({
        "balance": args.balance,
        "annual_rate_pct": args.rate,
        "payment": args.payment,
    });
    Ok(invoke("mortgage.payoffMonths", params)?)
}
