//! Savings goals solved backwards: the FIRE number and how long (or how
//! much a month) it takes to get there, and the monthly investment that
//! reaches a fixed target in a fixed number of years.

use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::capital::{compound, overflow};
use crate::error::FinCalcError;
use crate::types::{monthly_rate, round_currency, with_metadata, ComputationOutput, Money, Percent};
use crate::FinCalcResult;

/// Longest horizon searched for financial independence.
const MAX_YEARS: u32 = 100;

fn default_expected_return() -> Percent {
    dec!(7)
}

fn default_safe_withdrawal_rate() -> Percent {
    dec!(4)
}

fn default_inflation() -> Percent {
    dec!(2.5)
}

fn default_target_years() -> u32 {
    20
}

// ---------------------------------------------------------------------------
// FIRE number
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FireInput {
    pub monthly_expense: Money,
    #[serde(default)]
    pub current_savings: Money,
    #[serde(default)]
    pub monthly_investment: Money,
    #[serde(default = "default_expected_return")]
    pub expected_return_pct: Percent,
    /// Share of the portfolio withdrawn each year once independent.
    #[serde(default = "default_safe_withdrawal_rate")]
    pub safe_withdrawal_rate_pct: Percent,
    #[serde(default = "default_inflation")]
    pub inflation_rate_pct: Percent,
    /// Horizon for `monthly_investment_needed`.
    #[serde(default = "default_target_years")]
    pub target_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireResult {
    pub annual_expense: Money,
    /// Portfolio whose safe withdrawal covers the annual expense.
    pub fire_number: Money,
    /// The FIRE number inflated to the end of `target_years`.
    pub future_fire_number: Money,
    /// Whole years of saving until the FIRE number is reached; `None` when
    /// it is not reached within 100 years.
    pub years_to_fire: Option<u32>,
    /// Current savings as a share of the FIRE number, capped at 100.
    pub progress_pct: Decimal,
    /// Monthly investment that reaches the inflated target in `target_years`.
    pub monthly_investment_needed: Money,
}

/// FIRE number, years to reach it, and the monthly investment that would
/// reach it within the target horizon.
pub fn calculate_fire(input: &FireInput) -> FinCalcResult<ComputationOutput<FireResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_fire(input)?;

    let annual_expense = input.monthly_expense * dec!(12);
    let fire_number = annual_expense
        .checked_mul(dec!(100))
        .map(|v| v / input.safe_withdrawal_rate_pct)
        .ok_or_else(|| overflow("monthly_expense"))?;
    let r = monthly_rate(input.expected_return_pct);

    let progress_pct = if fire_number.is_zero() {
        dec!(100)
    } else {
        (input.current_savings / fire_number * dec!(100))
            .min(dec!(100))
            .round_dp(2)
    };

    let years_to_fire =
        years_to_reach(fire_number, input.current_savings, input.monthly_investment, r)?;
    if years_to_fire.is_none() {
        warnings.push(format!(
            "FIRE number is not reached within {MAX_YEARS} years at the current investment"
        ));
    }

    let inflation = (Decimal::ONE + input.inflation_rate_pct / dec!(100))
        .checked_powu(u64::from(input.target_years))
        .ok_or_else(|| overflow("inflation_rate_pct"))?;
    let future_fire_number = fire_number
        .checked_mul(inflation)
        .ok_or_else(|| overflow("inflation_rate_pct"))?;
    let monthly_investment_needed = required_monthly(
        future_fire_number,
        input.current_savings,
        r,
        input.target_years * 12,
    )?;

    let output = FireResult {
        annual_expense: round_currency(annual_expense),
        fire_number: round_currency(fire_number),
        future_fire_number: round_currency(future_fire_number),
        years_to_fire,
        progress_pct,
        monthly_investment_needed: round_currency(monthly_investment_needed),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "FIRE number from the safe withdrawal rate, yearly search with monthly compounding",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_fire(input: &FireInput) -> FinCalcResult<()> {
    non_negative(input.monthly_expense, "monthly_expense")?;
    non_negative(input.current_savings, "current_savings")?;
    non_negative(input.monthly_investment, "monthly_investment")?;
    return_above_total_loss(input.expected_return_pct, "expected_return_pct")?;
    let swr = input.safe_withdrawal_rate_pct;
    if swr <= Decimal::ZERO || swr > dec!(100) {
        return Err(FinCalcError::invalid(
            "safe_withdrawal_rate_pct",
            "Must be above 0 and at most 100 percent",
        ));
    }
    return_above_total_loss(input.inflation_rate_pct, "inflation_rate_pct")?;
    horizon(input.target_years, "target_years")
}

/// Years of monthly compounding until `savings` reaches `target`.
fn years_to_reach(
    target: Money,
    savings: Money,
    monthly_investment: Money,
    r: Decimal,
) -> FinCalcResult<Option<u32>> {
    if savings >= target {
        return Ok(Some(0));
    }
    if savings.is_zero() && monthly_investment.is_zero() {
        return Ok(None);
    }
    let mut balance = savings;
    for year in 1..=MAX_YEARS {
        for _ in 0..12 {
            balance = compound(balance, r, monthly_investment)?;
        }
        if balance >= target {
            return Ok(Some(year));
        }
    }
    Ok(None)
}

/// Level monthly investment that grows `initial` plus the investments to
/// `target` over `months`. Zero when `initial` alone gets there.
fn required_monthly(target: Money, initial: Money, r: Decimal, months: u32) -> FinCalcResult<Money> {
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(months))
        .ok_or_else(|| overflow("expected_return_pct"))?;
    let grown = initial.checked_mul(growth).ok_or_else(|| overflow("expected_return_pct"))?;
    let gap = target - grown;
    if gap <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let factor = growth - Decimal::ONE;
    if r.is_zero() || factor.is_zero() {
        Ok(gap / Decimal::from(months))
    } else {
        Ok(gap * r / factor)
    }
}

// ---------------------------------------------------------------------------
// Goal reverse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalReverseInput {
    pub target_amount: Money,
    pub years: u32,
    #[serde(default = "default_expected_return")]
    pub expected_return_pct: Percent,
    #[serde(default)]
    pub initial_capital: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReverseResult {
    pub monthly_investment: Money,
    /// Initial capital plus every monthly investment.
    pub total_contribution: Money,
    /// Part of the target earned by returns, never negative.
    pub total_interest: Money,
    /// Target over total contribution, as a percentage gain.
    pub effective_return_pct: Decimal,
}

/// Monthly investment needed to reach `target_amount` in `years`.
pub fn calculate_goal_reverse(
    input: &GoalReverseInput,
) -> FinCalcResult<ComputationOutput<GoalReverseResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    non_negative(input.target_amount, "target_amount")?;
    non_negative(input.initial_capital, "initial_capital")?;
    return_above_total_loss(input.expected_return_pct, "expected_return_pct")?;
    horizon(input.years, "years")?;

    let months = input.years * 12;
    let r = monthly_rate(input.expected_return_pct);
    let monthly_investment =
        round_currency(required_monthly(input.target_amount, input.initial_capital, r, months)?);
    if monthly_investment.is_zero() && !input.target_amount.is_zero() {
        warnings.push("Initial capital alone reaches the target".into());
    }

    let total_contribution = monthly_investment * Decimal::from(months) + input.initial_capital;
    let effective_return_pct = if total_contribution.is_zero() {
        Decimal::ZERO
    } else {
        ((input.target_amount / total_contribution - Decimal::ONE) * dec!(100)).round_dp(2)
    };

    let output = GoalReverseResult {
        monthly_investment,
        total_contribution,
        total_interest: (input.target_amount - total_contribution).max(Decimal::ZERO),
        effective_return_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sinking-fund payment on the gap left after compounding the initial capital",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn non_negative(value: Money, field: &str) -> FinCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "Cannot be negative"));
    }
    Ok(())
}

fn return_above_total_loss(pct: Percent, field: &str) -> FinCalcResult<()> {
    if pct <= dec!(-100) {
        return Err(FinCalcError::invalid(field, "Must be greater than -100%"));
    }
    Ok(())
}

fn horizon(years: u32, field: &str) -> FinCalcResult<()> {
    if years == 0 || years > MAX_YEARS {
        return Err(FinCalcError::invalid(
            field,
            format!("Must be between 1 and {MAX_YEARS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_input() -> FireInput {
        FireInput {
            monthly_expense: dec!(50_000),
            current_savings: dec!(3_000_000),
            monthly_investment: dec!(30_000),
            expected_return_pct: dec!(7),
            safe_withdrawal_rate_pct: dec!(4),
            inflation_rate_pct: dec!(2.5),
            target_years: 20,
        }
    }

    #[test]
    fn test_fire_number_from_withdrawal_rate() {
        let r = calculate_fire(&fire_input()).unwrap().result;
        assert_eq!(r.annual_expense, dec!(600_000));
        assert_eq!(r.fire_number, dec!(15_000_000));
        assert_eq!(r.progress_pct, dec!(20));
        assert!(r.future_fire_number > r.fire_number);
    }

    #[test]
    fn test_zero_return_years_and_monthly_need() {
        let input = FireInput {
            current_savings: Decimal::ZERO,
            monthly_investment: dec!(100_000),
            expected_return_pct: Decimal::ZERO,
            inflation_rate_pct: Decimal::ZERO,
            ..fire_input()
        };
        let r = calculate_fire(&input).unwrap().result;
        // 1,200,000 a year against 15,000,000 takes 12.5, so 13 whole years.
        assert_eq!(r.years_to_fire, Some(13));
        assert_eq!(r.monthly_investment_needed, dec!(62_500));
        assert_eq!(r.future_fire_number, r.fire_number);
    }

    #[test]
    fn test_savings_already_at_target() {
        let input = FireInput {
            current_savings: dec!(20_000_000),
            monthly_investment: Decimal::ZERO,
            inflation_rate_pct: Decimal::ZERO,
            ..fire_input()
        };
        let r = calculate_fire(&input).unwrap().result;
        assert_eq!(r.years_to_fire, Some(0));
        assert_eq!(r.progress_pct, dec!(100));
        assert_eq!(r.monthly_investment_needed, Decimal::ZERO);
    }

    #[test]
    fn test_unreachable_fire_number_warns() {
        let input = FireInput {
            monthly_expense: dec!(1_000_000),
            current_savings: Decimal::ZERO,
            monthly_investment: dec!(1_000),
            expected_return_pct: Decimal::ZERO,
            ..fire_input()
        };
        let out = calculate_fire(&input).unwrap();
        assert_eq!(out.result.years_to_fire, None);
        assert_eq!(out.warnings.len(), 1);

        let idle = FireInput {
            current_savings: Decimal::ZERO,
            monthly_investment: Decimal::ZERO,
            ..fire_input()
        };
        assert_eq!(calculate_fire(&idle).unwrap().result.years_to_fire, None);
    }

    #[test]
    fn test_returns_shorten_the_road() {
        let flat = FireInput {
            expected_return_pct: Decimal::ZERO,
            ..fire_input()
        };
        let with_returns = calculate_fire(&fire_input()).unwrap().result;
        let without = calculate_fire(&flat).unwrap().result;
        assert!(with_returns.years_to_fire.unwrap() < without.years_to_fire.unwrap());
        assert!(with_returns.monthly_investment_needed < without.monthly_investment_needed);
    }

    #[test]
    fn test_fire_invalid_inputs() {
        let mut i = fire_input();
        i.safe_withdrawal_rate_pct = Decimal::ZERO;
        assert!(calculate_fire(&i).is_err());

        let mut i = fire_input();
        i.monthly_expense = dec!(-1);
        assert!(calculate_fire(&i).is_err());

        let mut i = fire_input();
        i.target_years = 0;
        assert!(calculate_fire(&i).is_err());
    }

    fn goal_input() -> GoalReverseInput {
        GoalReverseInput {
            target_amount: dec!(2_400_000),
            years: 10,
            expected_return_pct: dec!(7),
            initial_capital: Decimal::ZERO,
        }
    }

    #[test]
    fn test_goal_without_returns_is_linear() {
        let input = GoalReverseInput {
            expected_return_pct: Decimal::ZERO,
            ..goal_input()
        };
        let r = calculate_goal_reverse(&input).unwrap().result;
        assert_eq!(r.monthly_investment, dec!(20_000));
        assert_eq!(r.total_contribution, dec!(2_400_000));
        assert_eq!(r.total_interest, Decimal::ZERO);
        assert_eq!(r.effective_return_pct, Decimal::ZERO);
    }

    #[test]
    fn test_goal_with_returns_needs_less() {
        let r = calculate_goal_reverse(&goal_input()).unwrap().result;
        assert!(r.monthly_investment < dec!(20_000));
        assert_eq!(r.total_contribution, r.monthly_investment * dec!(120));
        assert_eq!(r.total_interest, dec!(2_400_000) - r.total_contribution);
        assert!(r.effective_return_pct > Decimal::ZERO);
    }

    #[test]
    fn test_initial_capital_covers_goal() {
        let input = GoalReverseInput {
            target_amount: dec!(1_000_000),
            years: 5,
            initial_capital: dec!(1_000_000),
            ..goal_input()
        };
        let out = calculate_goal_reverse(&input).unwrap();
        assert_eq!(out.result.monthly_investment, Decimal::ZERO);
        assert_eq!(out.result.total_contribution, dec!(1_000_000));
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_goal_invalid_inputs() {
        let mut i = goal_input();
        i.years = 0;
        assert!(calculate_goal_reverse(&i).is_err());

        let mut i = goal_input();
        i.target_amount = dec!(-5);
        assert!(calculate_goal_reverse(&i).is_err());
    }
}
