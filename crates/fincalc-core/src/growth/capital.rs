//! Capital growth projection: monthly compounding with contributions, an
//! inflation-deflated path and optimistic/pessimistic return bands.

use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{monthly_rate, round_currency, with_metadata, ComputationOutput, Money, Percent};
use crate::FinCalcResult;

const MAX_YEARS: u32 = 100;

fn default_spread() -> Percent {
    dec!(2)
}

fn default_withdrawal_rate() -> Percent {
    dec!(4)
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapitalGrowthInput {
    pub initial_capital: Money,
    #[serde(default)]
    pub monthly_contribution: Money,
    pub annual_return_pct: Percent,
    #[serde(default)]
    pub inflation_rate_pct: Percent,
    pub years: u32,
    /// Return offset for the optimistic and pessimistic paths.
    #[serde(default = "default_spread")]
    pub sensitivity_spread_pct: Percent,
    /// Annual withdrawal rate used for the passive-income estimate.
    #[serde(default = "default_withdrawal_rate")]
    pub withdrawal_rate_pct: Percent,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: u32,
    pub contributed: Money,
    pub gains: Money,
    pub nominal_value: Money,
    /// Nominal value deflated to today's money.
    pub real_value: Money,
    pub optimistic_value: Money,
    pub pessimistic_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGrowthResult {
    /// Year 0 (the starting position) through `years`.
    pub yearly: Vec<GrowthYear>,
    pub final_nominal_value: Money,
    pub final_real_value: Money,
    pub total_contributed: Money,
    pub total_gains: Money,
    pub monthly_passive_income: Money,
    pub real_monthly_passive_income: Money,
}

/// Compound growth with monthly contributions, deflated by inflation.
pub fn project_capital_growth(
    input: &CapitalGrowthInput,
) -> FinCalcResult<ComputationOutput<CapitalGrowthResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let base = monthly_rate(input.annual_return_pct);
    let optimistic = monthly_rate(input.annual_return_pct + input.sensitivity_spread_pct);
    let pessimistic =
        monthly_rate((input.annual_return_pct - input.sensitivity_spread_pct).max(dec!(-100)));
    let inflation = Decimal::ONE + input.inflation_rate_pct / dec!(100);

    let mut value = input.initial_capital;
    let mut value_opt = input.initial_capital;
    let mut value_pess = input.initial_capital;
    let mut contributed = input.initial_capital;

    let mut yearly = Vec::with_capacity(input.years as usize + 1);
    yearly.push(GrowthYear {
        year: 0,
        contributed: round_currency(contributed),
        gains: Decimal::ZERO,
        nominal_value: round_currency(value),
        real_value: round_currency(value),
        optimistic_value: round_currency(value),
        pessimistic_value: round_currency(value),
    });

    for year in 1..=input.years {
        for _ in 0..12 {
            value = compound(value, base, input.monthly_contribution)?;
            value_opt = compound(value_opt, optimistic, input.monthly_contribution)?;
            value_pess = compound(value_pess, pessimistic, input.monthly_contribution)?;
            contributed += input.monthly_contribution;
        }
        let deflator = inflation
            .checked_powu(u64::from(year))
            .filter(|d| !d.is_zero())
            .ok_or_else(|| overflow("inflation_rate_pct"))?;

        yearly.push(GrowthYear {
            year,
            contributed: round_currency(contributed),
            gains: round_currency(value - contributed),
            nominal_value: round_currency(value),
            real_value: round_currency(value / deflator),
            optimistic_value: round_currency(value_opt),
            pessimistic_value: round_currency(value_pess),
        });
    }

    let last = yearly
        .last()
        .cloned()
        .ok_or_else(|| FinCalcError::invalid("years", "Projection produced no rows"))?;
    if last.gains < Decimal::ZERO {
        warnings.push(format!(
            "Projected value is {} below the {} contributed",
            -last.gains, last.contributed
        ));
    }

    let monthly_withdrawal = input.withdrawal_rate_pct / dec!(100) / dec!(12);
    let output = CapitalGrowthResult {
        final_nominal_value: last.nominal_value,
        final_real_value: last.real_value,
        total_contributed: last.contributed,
        total_gains: last.gains,
        monthly_passive_income: round_currency(last.nominal_value * monthly_withdrawal),
        real_monthly_passive_income: round_currency(last.real_value * monthly_withdrawal),
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly compounding with contributions, inflation-deflated",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate(input: &CapitalGrowthInput) -> FinCalcResult<()> {
    if input.initial_capital < Decimal::ZERO {
        return Err(FinCalcError::invalid("initial_capital", "Cannot be negative"));
    }
    if input.monthly_contribution < Decimal::ZERO {
        return Err(FinCalcError::invalid("monthly_contribution", "Cannot be negative"));
    }
    if input.annual_return_pct <= dec!(-100) {
        return Err(FinCalcError::invalid(
            "annual_return_pct",
            "Return must be greater than -100%",
        ));
    }
    if input.inflation_rate_pct <= dec!(-100) {
        return Err(FinCalcError::invalid(
            "inflation_rate_pct",
            "Inflation must be greater than -100%",
        ));
    }
    if input.years == 0 || input.years > MAX_YEARS {
        return Err(FinCalcError::invalid(
            "years",
            format!("Must be between 1 and {MAX_YEARS}"),
        ));
    }
    if input.sensitivity_spread_pct < Decimal::ZERO {
        return Err(FinCalcError::invalid("sensitivity_spread_pct", "Cannot be negative"));
    }
    if input.withdrawal_rate_pct < Decimal::ZERO || input.withdrawal_rate_pct > dec!(100) {
        return Err(FinCalcError::invalid(
            "withdrawal_rate_pct",
            "Must be between 0 and 100 percent",
        ));
    }
    Ok(())
}

pub(super) fn compound(value: Money, monthly: Decimal, contribution: Money) -> FinCalcResult<Money> {
    value
        .checked_mul(Decimal::ONE + monthly)
        .and_then(|v| v.checked_add(contribution))
        .ok_or_else(|| overflow("annual_return_pct"))
}

pub(super) fn overflow(field: &str) -> FinCalcError {
    FinCalcError::invalid(field, "Projection overflows decimal precision")
}
