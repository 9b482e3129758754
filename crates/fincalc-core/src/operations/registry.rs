//! Named operations with parameter schemas and JSON dispatch.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

use super::schema::{InputSchema, PropertySchema};
use crate::error::FinCalcError;
use crate::growth::capital::project_capital_growth;
use crate::growth::goals::{calculate_fire, calculate_goal_reverse};
use crate::mortgage::amortization::calculate_mortgage;
use crate::mortgage::early_repayment::{analyze_early_repayment, months_to_payoff};
use crate::mortgage::refinance::evaluate_refinance;
use crate::salary::net_pay::{calculate_net_pay, gross_from_net};
use crate::scenarios::sweep::sweep_json;
use crate::tax::deductions::{
    compute_deductions, DeductionBreakdown, DeductionInput, DeductionTable,
};
use crate::tax::income_tax::calculate_income_tax;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, ScenarioAxis};
use crate::FinCalcResult;

pub const MORTGAGE_CALCULATE: &str = "mortgage.calculate";
pub const MORTGAGE_EARLY_REPAYMENT: &str = "mortgage.earlyRepayment";
pub const MORTGAGE_REFINANCE: &str = "mortgage.refinance";
pub const MORTGAGE_PAYOFF_MONTHS: &str = "mortgage.payoffMonths";
pub const TAX_DEDUCTIONS: &str = "tax.deductions";
pub const TAX_CALCULATE: &str = "tax.calculate";
pub const CAPITAL_GROWTH: &str = "capital.growth";
pub const CAPITAL_FIRE: &str = "capital.fire";
pub const CAPITAL_GOAL_REVERSE: &str = "capital.goalReverse";
pub const SALARY_NET_PAY: &str = "salary.netPay";
pub const SALARY_GROSS_FROM_NET: &str = "salary.grossFromNet";
pub const SCENARIO_SWEEP: &str = "scenario.sweep";

/// A remotely invocable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub id: String,
    pub description: String,
    pub parameters: InputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PayoffParams {
    balance: Money,
    annual_rate_pct: Percent,
    payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PayoffResult {
    months: u32,
    years: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeductionParams {
    household: DeductionInput,
    table: DeductionTable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SweepParams {
    operation: String,
    base: Value,
    axis: ScenarioAxis,
}

/// Every registered operation, in a stable order.
pub fn list_operations() -> Vec<OperationDescriptor> {
    vec![
        descriptor(
            MORTGAGE_CALCULATE,
            "Monthly payment, totals and optional schedule for a fixed-rate loan with an optional interest-only grace period",
            loan_schema(),
        ),
        descriptor(
            MORTGAGE_EARLY_REPAYMENT,
            "Effect of an extra payment under the shorten-term and reduce-payment strategies",
            early_repayment_schema(),
        ),
        descriptor(
            MORTGAGE_REFINANCE,
            "Compare the current loan with a refinanced one and compute the break-even month",
            refinance_schema(),
        ),
        descriptor(
            MORTGAGE_PAYOFF_MONTHS,
            "Number of fixed payments needed to repay a balance",
            payoff_schema(),
        ),
        descriptor(
            TAX_DEDUCTIONS,
            "Exemptions, standard or itemized deduction, salary deduction and basic living expense differential",
            InputSchema::object()
                .property("household", PropertySchema::object("Household facts", household_schema()), true)
                .property("table", PropertySchema::object("Deduction amounts for the tax year", deduction_table_schema()), true),
        ),
        descriptor(
            TAX_CALCULATE,
            "Progressive income tax for a household under the supplied tax-year tables",
            InputSchema::object()
                .property("household", PropertySchema::object("Household facts", household_schema()), true)
                .property("tables", PropertySchema::object("Tax-year brackets and deductions", tables_schema()), true),
        ),
        descriptor(
            CAPITAL_GROWTH,
            "Compound growth of savings with monthly contributions, deflated by inflation",
            growth_schema(),
        ),
        descriptor(
            CAPITAL_FIRE,
            "FIRE number from the safe withdrawal rate, years to reach it and the monthly investment needed",
            fire_schema(),
        ),
        descriptor(
            CAPITAL_GOAL_REVERSE,
            "Monthly investment that reaches a target amount in a given number of years",
            goal_reverse_schema(),
        ),
        descriptor(
            SALARY_NET_PAY,
            "Insurance premiums, pension contributions, take-home pay and optional annual income tax",
            net_pay_schema(),
        ),
        descriptor(
            SALARY_GROSS_FROM_NET,
            "Lowest monthly salary whose take-home reaches a target",
            gross_from_net_schema(),
        ),
        descriptor(
            SCENARIO_SWEEP,
            "Run another operation once per value of one parameter",
            sweep_schema(),
        ),
    ]
}

/// Look up a single operation.
pub fn describe(id: &str) -> FinCalcResult<OperationDescriptor> {
    list_operations()
        .into_iter()
        .find(|op| op.id == id)
        .ok_or_else(|| FinCalcError::UnknownOperation(id.to_string()))
}

/// Run operation `id` on a JSON parameter object, returning the serialized
/// computation output.
pub fn invoke(id: &str, params: Value) -> FinCalcResult<Value> {
    debug!(operation = id, "invoking operation");
    match id {
        MORTGAGE_CALCULATE => run(params, calculate_mortgage),
        MORTGAGE_EARLY_REPAYMENT => run(params, analyze_early_repayment),
        MORTGAGE_REFINANCE => run(params, evaluate_refinance),
        MORTGAGE_PAYOFF_MONTHS => run(params, payoff),
        TAX_DEDUCTIONS => run(params, deduction_breakdown),
        TAX_CALCULATE => run(params, calculate_income_tax),
        CAPITAL_GROWTH => run(params, project_capital_growth),
        CAPITAL_FIRE => run(params, calculate_fire),
        CAPITAL_GOAL_REVERSE => run(params, calculate_goal_reverse),
        SALARY_NET_PAY => run(params, calculate_net_pay),
        SALARY_GROSS_FROM_NET => run(params, gross_from_net),
        SCENARIO_SWEEP => {
            let sweep: SweepParams = parse(params)?;
            if sweep.operation == SCENARIO_SWEEP {
                return Err(FinCalcError::invalid("operation", "Sweeps cannot be nested"));
            }
            describe(&sweep.operation)?;
            let output = sweep_json(&sweep.base, &sweep.axis, |p| invoke(&sweep.operation, p))?;
            Ok(serde_json::to_value(output)?)
        }
        _ => Err(FinCalcError::UnknownOperation(id.to_string())),
    }
}

fn parse<P: DeserializeOwned>(params: Value) -> FinCalcResult<P> {
    serde_json::from_value(params).map_err(|e| FinCalcError::invalid("params", e.to_string()))
}

fn run<P, R, F>(params: Value, kernel: F) -> FinCalcResult<Value>
where
    P: DeserializeOwned,
    R: Serialize,
    F: FnOnce(&P) -> FinCalcResult<ComputationOutput<R>>,
{
    let input: P = parse(params)?;
    let output = kernel(&input)?;
    Ok(serde_json::to_value(output)?)
}

fn payoff(params: &PayoffParams) -> FinCalcResult<ComputationOutput<PayoffResult>> {
    let start = Instant::now();
    let months = months_to_payoff(params.balance, params.annual_rate_pct, params.payment)?;
    let output = PayoffResult {
        months,
        years: (Decimal::from(months) / dec!(12)).round_dp(2),
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Closed-form annuity term",
        params,
        Vec::new(),
        elapsed,
        output,
    ))
}

fn deduction_breakdown(
    params: &DeductionParams,
) -> FinCalcResult<ComputationOutput<DeductionBreakdown>> {
    let start = Instant::now();
    let output = compute_deductions(&params.household, &params.table)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Exemptions and deductions",
        params,
        Vec::new(),
        elapsed,
        output,
    ))
}

fn descriptor(id: &str, description: &str, parameters: InputSchema) -> OperationDescriptor {
    OperationDescriptor {
        id: id.to_string(),
        description: description.to_string(),
        parameters,
    }
}

// ---------------------------------------------------------------------------
// Parameter schemas
// ---------------------------------------------------------------------------

fn loan_schema() -> InputSchema {
    InputSchema::object()
        .property("principal", PropertySchema::number("Loan amount").with_minimum(0.0), true)
        .property(
            "annual_rate_pct",
            PropertySchema::number("Annual interest rate in percent (2.15 = 2.15%)").with_minimum(0.0),
            true,
        )
        .property("term_years", PropertySchema::number("Loan term in years"), true)
        .property(
            "grace_period_years",
            PropertySchema::number("Interest-only years at the start of the term")
                .with_minimum(0.0)
                .with_default(json!(0)),
            false,
        )
        .property(
            "include_schedule",
            PropertySchema::boolean("Return the month-by-month schedule").with_default(json!(false)),
            false,
        )
}

fn early_repayment_schema() -> InputSchema {
    InputSchema::object()
        .property("current_balance", PropertySchema::number("Outstanding balance").with_minimum(0.0), true)
        .property(
            "annual_rate_pct",
            PropertySchema::number("Annual interest rate in percent").with_minimum(0.0),
            true,
        )
        .property("remaining_years", PropertySchema::number("Years left on the loan"), true)
        .property(
            "extra_payment",
            PropertySchema::number("Extra amount paid, once or every month").with_minimum(0.0),
            true,
        )
        .property(
            "mode",
            PropertySchema::enum_type("How the extra amount is paid", &["lump_sum", "recurring_monthly"])
                .with_default(json!("lump_sum")),
            false,
        )
        .property(
            "strategy",
            PropertySchema::enum_type(
                "Strategy to evaluate; both when absent",
                &["shorten_term", "reduce_payment"],
            ),
            false,
        )
}

fn refinance_schema() -> InputSchema {
    InputSchema::object()
        .property("current_balance", PropertySchema::number("Outstanding balance").with_minimum(0.0), true)
        .property("current_rate_pct", PropertySchema::number("Current annual rate in percent"), true)
        .property("remaining_years", PropertySchema::number("Years left on the current loan"), true)
        .property("new_rate_pct", PropertySchema::number("Annual rate of the new loan in percent"), true)
        .property(
            "new_years",
            PropertySchema::number("Term of the new loan; the remaining term when absent"),
            false,
        )
        .property(
            "refinance_cost",
            PropertySchema::number("One-off switching cost")
                .with_minimum(0.0)
                .with_default(json!(30000)),
            false,
        )
}

fn payoff_schema() -> InputSchema {
    InputSchema::object()
        .property("balance", PropertySchema::number("Balance to repay").with_minimum(0.0), true)
        .property("annual_rate_pct", PropertySchema::number("Annual rate in percent"), true)
        .property("payment", PropertySchema::number("Fixed monthly payment"), true)
}

fn household_schema() -> InputSchema {
    InputSchema::object()
        .property("gross_income", PropertySchema::number("Annual gross income").with_minimum(0.0), true)
        .property(
            "salary_income",
            PropertySchema::number("Salary part of gross income; all of it when absent"),
            false,
        )
        .property("is_married", PropertySchema::boolean("Filing jointly with a spouse"), false)
        .property(
            "dependents_under_70",
            PropertySchema::integer("Dependents younger than 70").with_minimum(0.0),
            false,
        )
        .property(
            "dependents_over_70",
            PropertySchema::integer("Dependents aged 70 or over").with_minimum(0.0),
            false,
        )
        .property(
            "itemized_deductions",
            PropertySchema::number("Itemized deductions, used when above the standard deduction"),
            false,
        )
}

fn deduction_table_schema() -> InputSchema {
    InputSchema::object()
        .property("exemption_per_person", PropertySchema::number("Personal exemption"), true)
        .property("standard_deduction_single", PropertySchema::number("Standard deduction for one filer"), true)
        .property("salary_special_deduction_cap", PropertySchema::number("Cap on the salary deduction"), true)
        .property(
            "basic_living_expense_per_person",
            PropertySchema::number("Basic living expense per household member"),
            true,
        )
        .property(
            "senior_exemption_multiplier",
            PropertySchema::number("Exemption multiplier for dependents aged 70+").with_default(json!(1.5)),
            false,
        )
}

fn tables_schema() -> InputSchema {
    let bracket = InputSchema::object()
        .property("upper_bound", PropertySchema::number("Inclusive upper bound; omitted for the top bracket"), false)
        .property("marginal_rate_pct", PropertySchema::number("Marginal rate in percent").with_range(0.0, 100.0), true)
        .property("cumulative_deduction", PropertySchema::number("Amount subtracted from net × rate"), true);
    InputSchema::object()
        .property("tax_year", PropertySchema::integer("Tax year the tables apply to"), true)
        .property("effective_from", PropertySchema::string("First day the tables apply (YYYY-MM-DD)"), false)
        .property(
            "brackets",
            PropertySchema::array("Brackets in ascending order", PropertySchema::object("Bracket", bracket)),
            true,
        )
        .property("deductions", PropertySchema::object("Deduction amounts", deduction_table_schema()), true)
}

fn growth_schema() -> InputSchema {
    InputSchema::object()
        .property("initial_capital", PropertySchema::number("Starting capital").with_minimum(0.0), true)
        .property(
            "monthly_contribution",
            PropertySchema::number("Amount added every month").with_default(json!(0)),
            false,
        )
        .property("annual_return_pct", PropertySchema::number("Expected annual return in percent"), true)
        .property(
            "inflation_rate_pct",
            PropertySchema::number("Annual inflation in percent").with_default(json!(0)),
            false,
        )
        .property("years", PropertySchema::integer("Projection horizon").with_range(1.0, 100.0), true)
        .property(
            "sensitivity_spread_pct",
            PropertySchema::number("Return offset for optimistic and pessimistic paths").with_default(json!(2)),
            false,
        )
        .property(
            "withdrawal_rate_pct",
            PropertySchema::number("Annual withdrawal rate for passive income").with_default(json!(4)),
            false,
        )
}

fn fire_schema() -> InputSchema {
    InputSchema::object()
        .property("monthly_expense", PropertySchema::number("Monthly living expense").with_minimum(0.0), true)
        .property("current_savings", PropertySchema::number("Savings today").with_default(json!(0)), false)
        .property(
            "monthly_investment",
            PropertySchema::number("Amount invested every month").with_default(json!(0)),
            false,
        )
        .property(
            "expected_return_pct",
            PropertySchema::number("Expected annual return in percent").with_default(json!(7)),
            false,
        )
        .property(
            "safe_withdrawal_rate_pct",
            PropertySchema::number("Annual withdrawal rate once independent").with_default(json!(4)),
            false,
        )
        .property(
            "inflation_rate_pct",
            PropertySchema::number("Annual inflation in percent").with_default(json!(2.5)),
            false,
        )
        .property(
            "target_years",
            PropertySchema::integer("Horizon for the monthly investment needed")
                .with_range(1.0, 100.0)
                .with_default(json!(20)),
            false,
        )
}

fn goal_reverse_schema() -> InputSchema {
    InputSchema::object()
        .property("target_amount", PropertySchema::number("Amount to reach").with_minimum(0.0), true)
        .property("years", PropertySchema::integer("Years to reach it").with_range(1.0, 100.0), true)
        .property(
            "expected_return_pct",
            PropertySchema::number("Expected annual return in percent").with_default(json!(7)),
            false,
        )
        .property(
            "initial_capital",
            PropertySchema::number("Capital invested today").with_default(json!(0)),
            false,
        )
}

fn salary_tables_schema() -> InputSchema {
    let scale = InputSchema::object()
        .property("floor", PropertySchema::number("Lowest insured salary"), true)
        .property("cap", PropertySchema::number("Highest insured salary"), true)
        .property(
            "grades",
            PropertySchema::array("Ascending insured-salary grades", PropertySchema::number("Grade")),
            false,
        );
    let premium = InputSchema::object()
        .property("rate_pct", PropertySchema::number("Premium rate in percent").with_range(0.0, 100.0), true)
        .property(
            "employee_share_pct",
            PropertySchema::number("Employee part of the premium in percent").with_range(0.0, 100.0),
            true,
        )
        .property("scale", PropertySchema::object("Insured-salary scale", scale.clone()), true);
    let pension = InputSchema::object()
        .property("employer_rate_pct", PropertySchema::number("Employer contribution in percent"), true)
        .property("max_self_rate_pct", PropertySchema::number("Highest voluntary employee contribution"), true)
        .property("scale", PropertySchema::object("Insured-salary scale", scale), true);
    InputSchema::object()
        .property("year", PropertySchema::integer("Year the tables apply to"), true)
        .property("effective_from", PropertySchema::string("First day the tables apply (YYYY-MM-DD)"), false)
        .property("labor_insurance", PropertySchema::object("Labor insurance", premium.clone()), true)
        .property("health_insurance", PropertySchema::object("Health insurance", premium), true)
        .property("labor_pension", PropertySchema::object("Labor pension", pension), true)
        .property(
            "max_health_dependents",
            PropertySchema::integer("Dependents charged a health premium").with_default(json!(3)),
            false,
        )
}

fn net_pay_schema() -> InputSchema {
    InputSchema::object()
        .property("monthly_salary", PropertySchema::number("Gross monthly salary").with_minimum(0.0), true)
        .property(
            "bonus_months",
            PropertySchema::number("Year-end bonus in months of salary").with_default(json!(0)),
            false,
        )
        .property(
            "dependents",
            PropertySchema::integer("Health-insurance dependents").with_minimum(0.0),
            false,
        )
        .property(
            "self_contribution_rate_pct",
            PropertySchema::number("Voluntary pension contribution in percent").with_default(json!(0)),
            false,
        )
        .property("is_married", PropertySchema::boolean("Filing jointly with a spouse"), false)
        .property("tables", PropertySchema::object("Premium rates and scales", salary_tables_schema()), true)
        .property(
            "tax_tables",
            PropertySchema::object("Tax-year tables; annual income tax is omitted without them", tables_schema()),
            false,
        )
}

fn gross_from_net_schema() -> InputSchema {
    InputSchema::object()
        .property("target_take_home", PropertySchema::number("Monthly take-home to reach").with_minimum(0.0), true)
        .property(
            "dependents",
            PropertySchema::integer("Health-insurance dependents").with_minimum(0.0),
            false,
        )
        .property(
            "self_contribution_rate_pct",
            PropertySchema::number("Voluntary pension contribution in percent").with_default(json!(0)),
            false,
        )
        .property("tables", PropertySchema::object("Premium rates and scales", salary_tables_schema()), true)
}

fn sweep_schema() -> InputSchema {
    let axis = InputSchema::object()
        .property(
            "parameter_name",
            PropertySchema::string("Dotted path of the parameter to vary, e.g. household.dependents_under_70"),
            true,
        )
        .property("values", PropertySchema::array("Values in evaluation order", PropertySchema::number("Value")), true)
        .property("baseline", PropertySchema::number("Value of the unmodified case"), false);
    InputSchema::object()
        .property("operation", PropertySchema::string("Id of the operation to sweep"), true)
        .property("base", PropertySchema::object("Base parameters of that operation", InputSchema::object()), true)
        .property("axis", PropertySchema::object("Parameter to vary", axis), true)
}
