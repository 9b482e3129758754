pub mod amortization;
pub mod early_repayment;
pub mod refinance;

use rust_decimal::Decimal;

use crate::error::FinCalcError;
use crate::types::{whole_months, Money, Percent, Years};
use crate::FinCalcResult;

pub(crate) fn require_positive(value: Money, field: &str) -> FinCalcResult<()> {
    if value <= Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "Must be greater than zero"));
    }
    Ok(())
}

pub(crate) fn require_non_negative(value: Decimal, field: &str) -> FinCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "Cannot be negative"));
    }
    Ok(())
}

pub(crate) fn require_rate(annual_rate_pct: Percent, field: &str) -> FinCalcResult<()> {
    require_non_negative(annual_rate_pct, field)
}

/// Totals of a level schedule paying `paid` in rounded installments. When
/// rounding leaves the installments short of the principal, the final
/// installment settles the shortfall, so `total_interest` is always
/// `total_payment − principal` and never negative.
pub(crate) fn settled_totals(paid: Money, principal: Money) -> (Money, Money) {
    let total_payment = paid.max(principal);
    (total_payment, total_payment - principal)
}

/// Whole months in a loan term that must be at least one month long.
pub(crate) fn term_months(years: Years, field: &str) -> FinCalcResult<u32> {
    if years <= Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "Term must be greater than zero"));
    }
    whole_months(years, field)
}
