//! Early repayment: what an extra payment (one-off or every month) buys
//! under the two usual bank options, keep the payment and shorten the term,
//! or keep the term and lower the payment.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::{level_payment, monthly_payment};
use super::{require_non_negative, require_positive, require_rate, settled_totals, term_months};
use crate::error::FinCalcError;
use crate::types::{
    monthly_rate, round_currency, with_metadata, ComputationOutput, Money, Percent, Rate, Years,
};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentStrategy {
    /// Keep the monthly payment, finish earlier.
    ShortenTerm,
    /// Keep the remaining term, pay less each month.
    ReducePayment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPaymentMode {
    /// A single payment made today.
    #[default]
    LumpSum,
    /// The same extra amount on top of every monthly payment.
    RecurringMonthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EarlyRepaymentInput {
    /// Outstanding principal today.
    pub current_balance: Money,
    pub annual_rate_pct: Percent,
    pub remaining_years: Years,
    /// Extra amount repaid (once, or every month for `recurring_monthly`).
    pub extra_payment: Money,
    #[serde(default)]
    pub mode: ExtraPaymentMode,
    /// Strategy to evaluate; both when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RepaymentStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortenTermOutcome {
    /// Months until payoff with the extra payment applied.
    pub new_months: u32,
    pub months_saved: u32,
    pub years_saved: Decimal,
    pub new_total_interest: Money,
    pub saved_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducePaymentOutcome {
    pub new_monthly_payment: Money,
    pub monthly_savings: Money,
    pub new_total_interest: Money,
    pub saved_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyRepaymentResult {
    pub original_monthly: Money,
    pub original_months: u32,
    pub original_total_interest: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shorten_term: Option<ShortenTermOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_payment: Option<ReducePaymentOutcome>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Number of level payments of `payment` needed to clear `balance`.
///
/// Closed form `ceil(−ln(1 − B·r/P) / ln(1+r))`, or `ceil(B/P)` at a zero
/// rate. Fails with [`FinCalcError::InfeasibleRepayment`] when the payment
/// does not even cover one month of interest (`B·r ≥ P`).
pub fn months_to_payoff(
    balance: Money,
    annual_rate_pct: Percent,
    payment: Money,
) -> FinCalcResult<u32> {
    require_non_negative(balance, "balance")?;
    require_rate(annual_rate_pct, "annual_rate_pct")?;
    require_positive(payment, "payment")?;
    solve_term(balance, monthly_rate(annual_rate_pct), payment)
}

/// Evaluate an extra repayment under one or both strategies.
pub fn analyze_early_repayment(
    input: &EarlyRepaymentInput,
) -> FinCalcResult<ComputationOutput<EarlyRepaymentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let r = monthly_rate(input.annual_rate_pct);
    let original_months = term_months(input.remaining_years, "remaining_years")?;
    let original_monthly =
        monthly_payment(input.current_balance, input.annual_rate_pct, input.remaining_years)?;
    // A payment rounded to zero, or down to the first month's interest, never
    // retires the balance.
    if original_monthly <= input.current_balance * r {
        return Err(FinCalcError::invalid(
            "current_balance",
            "Balance is too small to amortize: the rounded monthly payment does not cover the interest",
        ));
    }
    let original_total_interest =
        level_interest(original_monthly, original_months, input.current_balance, r);

    let original = OriginalSchedule {
        balance: input.current_balance,
        monthly: original_monthly,
        months: original_months,
        total_interest: original_total_interest,
    };

    if input.mode == ExtraPaymentMode::LumpSum && input.extra_payment == input.current_balance {
        warnings.push("Extra payment settles the loan in full".into());
    }

    let wants = |s: RepaymentStrategy| input.strategy.map_or(true, |chosen| chosen == s);

    let shorten_term = if wants(RepaymentStrategy::ShortenTerm) {
        Some(evaluate_shorten_term(&original, r, input.extra_payment, input.mode)?)
    } else {
        None
    };

    let reduce_payment = if wants(RepaymentStrategy::ReducePayment) {
        if input.mode == ExtraPaymentMode::RecurringMonthly && !input.extra_payment.is_zero() {
            warnings.push(
                "Recurring extra payments leave today's balance unchanged, so the \
                 reduce-payment strategy keeps the original monthly payment"
                    .into(),
            );
        }
        Some(evaluate_reduce_payment(&original, r, input.extra_payment, input.mode)?)
    } else {
        None
    };

    let output = EarlyRepaymentResult {
        original_monthly,
        original_months,
        original_total_interest,
        shorten_term,
        reduce_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Early repayment: shorten-term vs reduce-payment",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

struct OriginalSchedule {
    balance: Money,
    monthly: Money,
    months: u32,
    total_interest: Money,
}

fn evaluate_shorten_term(
    original: &OriginalSchedule,
    r: Rate,
    extra: Money,
    mode: ExtraPaymentMode,
) -> FinCalcResult<ShortenTermOutcome> {
    if extra.is_zero() {
        return Ok(ShortenTermOutcome {
            new_months: original.months,
            months_saved: 0,
            years_saved: Decimal::ZERO,
            new_total_interest: original.total_interest,
            saved_interest: Decimal::ZERO,
        });
    }

    let (balance, payment) = match mode {
        ExtraPaymentMode::LumpSum => (original.balance - extra, original.monthly),
        ExtraPaymentMode::RecurringMonthly => (original.balance, original.monthly + extra),
    };

    let (new_months, new_total_interest) = if balance.is_zero() {
        (0, Decimal::ZERO)
    } else {
        // An extra payment can never lengthen the loan or add interest; the
        // caps absorb the rounding of the original level payment.
        let months = solve_term(balance, r, payment)?.min(original.months);
        let interest = payoff_interest(balance, r, payment, months)?;
        (months, interest.min(original.total_interest))
    };

    let months_saved = original.months - new_months;
    Ok(ShortenTermOutcome {
        new_months,
        months_saved,
        years_saved: (Decimal::from(months_saved) / dec!(12)).round_dp(2),
        new_total_interest,
        saved_interest: original.total_interest - new_total_interest,
    })
}

fn evaluate_reduce_payment(
    original: &OriginalSchedule,
    r: Rate,
    extra: Money,
    mode: ExtraPaymentMode,
) -> FinCalcResult<ReducePaymentOutcome> {
    let balance = match mode {
        ExtraPaymentMode::LumpSum => original.balance - extra,
        ExtraPaymentMode::RecurringMonthly => original.balance,
    };

    let (new_monthly_payment, new_total_interest) = if balance.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let payment = level_payment(balance, r, original.months)?;
        let interest = level_interest(payment, original.months, balance, r);
        (payment, interest.min(original.total_interest))
    };

    Ok(ReducePaymentOutcome {
        new_monthly_payment,
        monthly_savings: original.monthly - new_monthly_payment,
        new_total_interest,
        saved_interest: original.total_interest - new_total_interest,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &EarlyRepaymentInput) -> FinCalcResult<()> {
    require_positive(input.current_balance, "current_balance")?;
    require_rate(input.annual_rate_pct, "annual_rate_pct")?;
    require_non_negative(input.extra_payment, "extra_payment")?;
    if input.mode == ExtraPaymentMode::LumpSum && input.extra_payment > input.current_balance {
        return Err(FinCalcError::invalid(
            "extra_payment",
            "Lump-sum payment exceeds the outstanding balance",
        ));
    }
    Ok(())
}

/// Interest of a level schedule: everything paid above the principal.
fn level_interest(payment: Money, months: u32, principal: Money, r: Rate) -> Money {
    if r.is_zero() {
        return Decimal::ZERO;
    }
    settled_totals(payment * Decimal::from(months), principal).1
}

fn solve_term(balance: Money, r: Rate, payment: Money) -> FinCalcResult<u32> {
    if balance <= Decimal::ZERO {
        return Ok(0);
    }
    require_positive(payment, "payment")?;

    let infeasible = || FinCalcError::InfeasibleRepayment {
        balance,
        payment,
        monthly_rate: r,
    };

    let linear = |b: Money| (b / payment).ceil();

    let months = if r.is_zero() {
        linear(balance)
    } else {
        let ratio = balance * r / payment;
        if ratio >= Decimal::ONE {
            return Err(infeasible());
        }
        let remaining_ln = (Decimal::ONE - ratio).checked_ln().ok_or_else(infeasible)?;
        let growth_ln = (Decimal::ONE + r).checked_ln().unwrap_or(Decimal::ZERO);
        if growth_ln <= Decimal::ZERO {
            // Rate below the precision of ln(1+r); interest is negligible.
            linear(balance)
        } else {
            (-remaining_ln / growth_ln).ceil()
        }
    };

    months
        .to_u32()
        .map(|m| m.max(1))
        .ok_or_else(infeasible)
}

/// Total interest when `balance` is repaid by `months − 1` payments of
/// `payment` followed by one final installment settling the remainder.
fn payoff_interest(balance: Money, r: Rate, payment: Money, months: u32) -> FinCalcResult<Money> {
    if r.is_zero() || months == 0 {
        return Ok(Decimal::ZERO);
    }
    let full_payments = months - 1;
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(full_payments))
        .ok_or_else(|| {
            FinCalcError::invalid(
                "annual_rate_pct",
                "Rate is too large to amortize over the requested term",
            )
        })?;
    let residual = (balance * growth - payment * (growth - Decimal::ONE) / r).max(Decimal::ZERO);
    let final_installment = round_currency(residual * (Decimal::ONE + r));
    let paid = payment * Decimal::from(full_payments) + final_installment;
    Ok(settled_totals(paid, balance).1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
