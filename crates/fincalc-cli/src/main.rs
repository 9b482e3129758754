mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::growth::{FireArgs, GoalArgs, GrowthArgs};
use commands::mortgage::{EarlyRepaymentArgs, MortgageArgs, PayoffArgs, RefinanceArgs};
use commands::operations::{InvokeArgs, OperationsArgs};
use commands::salary::{GrossFromNetArgs, SalaryArgs};
use commands::scenarios::SweepArgs;
use commands::tax::{DeductionsArgs, TaxArgs};

/// Consumer financial calculations
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Mortgage, refinance, income tax, take-home pay and savings goal calculations",
    long_about = "A CLI over the fincalc kernel: loan amortization with grace periods, \
                  early repayment and refinance analysis, progressive income tax with \
                  configurable tax-year tables, take-home pay from payroll tables, capital \
                  growth projections, FIRE and savings-goal solvers and one-axis scenario \
                  sweeps. All amounts use decimal arithmetic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log kernel activity to stderr (overrides FINCALC_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment and totals for a fixed-rate loan
    Mortgage(MortgageArgs),
    /// Effect of an extra repayment (shorten term vs reduce payment)
    EarlyRepayment(EarlyRepaymentArgs),
    /// Compare the current loan with a refinanced one
    Refinance(RefinanceArgs),
    /// Months needed to repay a balance with a fixed payment
    Payoff(PayoffArgs),
    /// Progressive income tax for a household
    Tax(TaxArgs),
    /// Exemptions and deductions for a household
    Deductions(DeductionsArgs),
    /// Take-home pay after insurance premiums, pension and income tax
    Salary(SalaryArgs),
    /// Monthly salary needed for a target take-home pay
    GrossFromNet(GrossFromNetArgs),
    /// Compound growth with monthly contributions and inflation
    Growth(GrowthArgs),
    /// FIRE number and the road to it
    Fire(FireArgs),
    /// Monthly investment needed to reach a savings goal
    Goal(GoalArgs),
    /// Run any operation once per value of one parameter
    Sweep(SweepArgs),
    /// Invoke a named operation with JSON parameters
    Invoke(InvokeArgs),
    /// List named operations and their parameter schemas
    Operations(OperationsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Mortgage(args) => commands::mortgage::run_mortgage(args),
        Commands::EarlyRepayment(args) => commands::mortgage::run_early_repayment(args),
        Commands::Refinance(args) => commands::mortgage::run_refinance(args),
        Commands::Payoff(args) => commands::mortgage::run_payoff(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::Deductions(args) => commands::tax::run_deductions(args),
        Commands::Salary(args) => commands::salary::run_salary(args),
        Commands::GrossFromNet(args) => commands::salary::run_gross_from_net(args),
        Commands::Growth(args) => commands::growth::run_growth(args),
        Commands::Fire(args) => commands::growth::run_fire(args),
        Commands::Goal(args) => commands::growth::run_goal(args),
        Commands::Sweep(args) => commands::scenarios::run_sweep(args),
        Commands::Invoke(args) => commands::operations::run_invoke(args),
        Commands::Operations(args) => commands::operations::run_operations(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
