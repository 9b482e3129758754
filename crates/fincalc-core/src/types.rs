use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::FinCalcResult;

/// All monetary values, in whole-unit currency of the caller's locale.
pub type Money = Decimal;

/// Percentages as plain numbers (2.15 = 2.15%). Converted to decimal rates
/// inside the kernel, never at the boundary.
pub type Percent = Decimal;

/// Decimal rates (0.0215 = 2.15%), internal only.
pub type Rate = Decimal;

/// Year counts. May be fractional as long as they cover whole months.
pub type Years = Decimal;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Round a currency amount to the nearest whole unit, halves away from zero.
pub fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an annual percentage to a monthly decimal rate (`/100/12`).
pub fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    annual_rate_pct / dec!(100) / MONTHS_PER_YEAR
}

/// Number of whole months in `years`. Zero is allowed; callers that need a
/// positive term check for it themselves.
pub fn whole_months(years: Years, field: &str) -> FinCalcResult<u32> {
    if years < Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "Years cannot be negative"));
    }
    let months = years * MONTHS_PER_YEAR;
    if !months.fract().is_zero() {
        return Err(FinCalcError::invalid(
            field,
            format!("{years} years is not a whole number of months"),
        ));
    }
    months
        .to_u32()
        .ok_or_else(|| FinCalcError::invalid(field, "Term is too long"))
}

/// One varying parameter of a scenario sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAxis {
    /// Field to override, as a dotted path into the parameter record
    /// (e.g. `"annual_rate_pct"` or `"household.dependents_under_70"`).
    pub parameter_name: String,
    /// Values to sweep, evaluated and reported in this order.
    pub values: Vec<Decimal>,
    /// Value of the unmodified case, reported back as `baseline_index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Decimal>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
