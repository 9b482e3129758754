//! Fixed-rate level-payment amortization with an optional interest-only
//! grace period.
//!
//! Every page that quotes a monthly mortgage payment goes through
//! [`monthly_payment`]; the grace-period and schedule variants are built on
//! the same formula so rounding stays consistent across callers.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{require_non_negative, require_positive, require_rate, settled_totals, term_months};
use crate::error::FinCalcError;
use crate::types::{
    monthly_rate, round_currency, whole_months, with_metadata, ComputationOutput, Money, Percent,
    Rate, Years,
};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Annual rates above this are accepted but flagged.
const HIGH_RATE_WARNING_PCT: Decimal = dec!(20);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan to amortize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoanParameters {
    /// Amount borrowed.
    pub principal: Money,
    /// Annual interest rate as a percentage (2.15 = 2.15%).
    pub annual_rate_pct: Percent,
    /// Full loan term including any grace period.
    pub term_years: Years,
    /// Leading interest-only years. Must be shorter than the term.
    #[serde(default)]
    pub grace_period_years: Years,
    /// Emit the month-by-month schedule.
    #[serde(default)]
    pub include_schedule: bool,
}

/// Payments with and after an interest-only grace period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GracePeriodBreakdown {
    /// Interest-only payment during the grace period.
    pub grace_period_payment: Money,
    /// Level payment once principal repayment starts.
    pub post_grace_payment: Money,
    pub grace_months: u32,
    pub repayment_months: u32,
    pub total_payment: Money,
    pub total_interest: Money,
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Outstanding balance after this month's payment.
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Level payment while principal is being repaid.
    pub monthly_payment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_payment: Option<Money>,
    pub grace_months: u32,
    pub repayment_months: u32,
    pub total_months: u32,
    pub total_payment: Money,
    pub total_interest: Money,
    /// Share of all payments that is interest, in percent (2 dp).
    pub interest_ratio_pct: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<ScheduleRow>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level monthly payment for `principal` over `years` at `annual_rate_pct`.
///
/// Uses `P·r·(1+r)^n / ((1+r)^n − 1)` and switches to `P / n` when the rate
/// is zero. The result is rounded to the nearest whole currency unit.
pub fn monthly_payment(principal: Money, annual_rate_pct: Percent, years: Years) -> FinCalcResult<Money> {
    require_positive(principal, "principal")?;
    require_rate(annual_rate_pct, "annual_rate_pct")?;
    let months = term_months(years, "years")?;
    level_payment(principal, monthly_rate(annual_rate_pct), months)
}

/// Payments for a loan whose first `grace_years` are interest-only.
///
/// Principal is not reduced during the grace period, so the full principal
/// is re-amortized over the remaining `total_years − grace_years`.
pub fn with_grace_period(
    principal: Money,
    annual_rate_pct: Percent,
    total_years: Years,
    grace_years: Years,
) -> FinCalcResult<GracePeriodBreakdown> {
    require_positive(principal, "principal")?;
    require_rate(annual_rate_pct, "annual_rate_pct")?;
    let total_months = term_months(total_years, "term_years")?;
    require_non_negative(grace_years, "grace_period_years")?;
    let grace_months = whole_months(grace_years, "grace_period_years")?;
    if grace_months >= total_months {
        return Err(FinCalcError::invalid(
            "grace_period_years",
            "Grace period must be shorter than the loan term",
        ));
    }

    let r = monthly_rate(annual_rate_pct);
    let repayment_months = total_months - grace_months;
    let grace_period_payment = round_currency(principal * r);
    let post_grace_payment = level_payment(principal, r, repayment_months)?;

    let (total_payment, total_interest) = if r.is_zero() {
        // The rounding residual of P/n is settled in the last installment.
        (principal, Decimal::ZERO)
    } else {
        let paid = grace_period_payment * Decimal::from(grace_months)
            + post_grace_payment * Decimal::from(repayment_months);
        settled_totals(paid, principal)
    };

    Ok(GracePeriodBreakdown {
        grace_period_payment,
        post_grace_payment,
        grace_months,
        repayment_months,
        total_payment,
        total_interest,
    })
}

/// Full mortgage calculation: payments, totals and optional schedule.
pub fn calculate_mortgage(
    input: &LoanParameters,
) -> FinCalcResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let breakdown = with_grace_period(
        input.principal,
        input.annual_rate_pct,
        input.term_years,
        input.grace_period_years,
    )?;

    if input.annual_rate_pct > HIGH_RATE_WARNING_PCT {
        warnings.push(format!(
            "Annual rate of {}% is unusually high for a mortgage",
            input.annual_rate_pct
        ));
    }

    if breakdown.grace_months > 0 {
        let without_grace = with_grace_period(
            input.principal,
            input.annual_rate_pct,
            input.term_years,
            Decimal::ZERO,
        )?;
        let extra = breakdown.total_interest - without_grace.total_interest;
        if extra > Decimal::ZERO {
            warnings.push(format!(
                "The {}-month grace period adds {} of interest; principal is not reduced while only interest is paid",
                breakdown.grace_months, extra
            ));
        }
    }

    let r = monthly_rate(input.annual_rate_pct);
    let schedule = input.include_schedule.then(|| {
        build_schedule(
            input.principal,
            r,
            breakdown.grace_months,
            breakdown.grace_period_payment,
            breakdown.repayment_months,
            breakdown.post_grace_payment,
        )
    });

    let interest_ratio_pct = if breakdown.total_payment > Decimal::ZERO {
        (breakdown.total_interest / breakdown.total_payment * dec!(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let output = AmortizationResult {
        monthly_payment: breakdown.post_grace_payment,
        grace_period_payment: (breakdown.grace_months > 0).then_some(breakdown.grace_period_payment),
        grace_months: breakdown.grace_months,
        repayment_months: breakdown.repayment_months,
        total_months: breakdown.grace_months + breakdown.repayment_months,
        total_payment: breakdown.total_payment,
        total_interest: breakdown.total_interest,
        interest_ratio_pct,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization with interest-only grace period",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rounded level payment for an already-validated loan.
pub(crate) fn level_payment(principal: Money, r: Rate, months: u32) -> FinCalcResult<Money> {
    let n = Decimal::from(months);
    if r.is_zero() {
        return Ok(round_currency(principal / n));
    }

    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(months))
        .ok_or_else(|| {
            FinCalcError::invalid(
                "annual_rate_pct",
                "Rate is too large to amortize over the requested term",
            )
        })?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        // Rate below decimal precision over this horizon.
        return Ok(round_currency(principal / n));
    }

    let payment = principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| {
            FinCalcError::invalid("principal", "Loan is too large to amortize at this rate")
        })?;
    Ok(round_currency(payment))
}

fn build_schedule(
    principal: Money,
    r: Rate,
    grace_months: u32,
    grace_payment: Money,
    repayment_months: u32,
    payment: Money,
) -> Vec<ScheduleRow> {
    let mut rows = Vec::with_capacity((grace_months + repayment_months) as usize);
    let mut balance = principal;

    for month in 1..=grace_months {
        rows.push(ScheduleRow {
            month,
            payment: grace_payment,
            interest: grace_payment,
            principal: Decimal::ZERO,
            balance,
        });
    }

    for k in 1..=repayment_months {
        let interest = round_currency(balance * r);
        let principal_part = if k == repayment_months {
            balance
        } else {
            (payment - interest).clamp(Decimal::ZERO, balance)
        };
        balance -= principal_part;
        rows.push(ScheduleRow {
            month: grace_months + k,
            payment: interest + principal_part,
            interest,
            principal: principal_part,
            balance,
        });
    }

    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
