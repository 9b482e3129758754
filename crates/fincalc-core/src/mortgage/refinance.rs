//! Refinance evaluation: remaining cost of the current loan against a new
//! loan for the same balance, with break-even on the switching cost.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::monthly_payment;
use super::{require_non_negative, require_positive, require_rate, settled_totals, term_months};
use crate::types::{monthly_rate, with_metadata, ComputationOutput, Money, Percent, Years};
use crate::FinCalcResult;

fn default_refinance_cost() -> Money {
    dec!(30_000)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefinanceInput {
    /// Outstanding balance, also the principal of the new loan.
    pub current_balance: Money,
    pub current_rate_pct: Percent,
    pub remaining_years: Years,
    pub new_rate_pct: Percent,
    /// Term of the new loan; the remaining term when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_years: Option<Years>,
    /// One-off cost of switching (prepayment penalty, fees).
    #[serde(default = "default_refinance_cost")]
    pub refinance_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceResult {
    pub current_monthly: Money,
    pub current_total_payment: Money,
    pub current_total_interest: Money,
    pub new_monthly: Money,
    pub new_total_payment: Money,
    pub new_total_interest: Money,
    pub monthly_savings: Money,
    pub total_savings: Money,
    pub refinance_cost: Money,
    pub net_savings: Money,
    /// Months of savings needed to recover the switching cost; `None` when
    /// the new payment is not lower.
    pub break_even_months: Option<u32>,
    pub is_worth_it: bool,
}

struct LoanTotals {
    monthly: Money,
    total_payment: Money,
    total_interest: Money,
}

/// Compare the current loan with a refinanced one.
pub fn evaluate_refinance(
    input: &RefinanceInput,
) -> FinCalcResult<ComputationOutput<RefinanceResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.current_balance, "current_balance")?;
    require_rate(input.current_rate_pct, "current_rate_pct")?;
    require_rate(input.new_rate_pct, "new_rate_pct")?;
    require_non_negative(input.refinance_cost, "refinance_cost")?;
    let remaining_months = term_months(input.remaining_years, "remaining_years")?;
    let new_years = input.new_years.unwrap_or(input.remaining_years);
    let new_months = term_months(new_years, "new_years")?;

    let current = loan_totals(
        input.current_balance,
        input.current_rate_pct,
        input.remaining_years,
        remaining_months,
    )?;
    let new = loan_totals(input.current_balance, input.new_rate_pct, new_years, new_months)?;

    if new_months > remaining_months {
        warnings.push(format!(
            "New term of {new_months} months is longer than the {remaining_months} months remaining; \
             a lower payment may still cost more interest overall"
        ));
    }

    let monthly_savings = current.monthly - new.monthly;
    let total_savings = current.total_interest - new.total_interest;
    let net_savings = total_savings - input.refinance_cost;

    let break_even_months = if monthly_savings > Decimal::ZERO {
        (input.refinance_cost / monthly_savings).ceil().to_u32()
    } else {
        None
    };

    let is_worth_it = net_savings > Decimal::ZERO
        && break_even_months.is_some_and(|months| months < remaining_months);

    let output = RefinanceResult {
        current_monthly: current.monthly,
        current_total_payment: current.total_payment,
        current_total_interest: current.total_interest,
        new_monthly: new.monthly,
        new_total_payment: new.total_payment,
        new_total_interest: new.total_interest,
        monthly_savings,
        total_savings,
        refinance_cost: input.refinance_cost,
        net_savings,
        break_even_months,
        is_worth_it,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance break-even analysis",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn loan_totals(
    principal: Money,
    annual_rate_pct: Percent,
    years: Years,
    months: u32,
) -> FinCalcResult<LoanTotals> {
    let monthly = monthly_payment(principal, annual_rate_pct, years)?;
    let (total_payment, total_interest) = if monthly_rate(annual_rate_pct).is_zero() {
        (principal, Decimal::ZERO)
    } else {
        settled_totals(monthly * Decimal::from(months), principal)
    };
    Ok(LoanTotals {
        monthly,
        total_payment,
        total_interest,
    })
}
