//! Payroll deductions: labor and health insurance premiums and the labor
//! pension, each charged on an insured salary looked up in per-year tables.

pub mod net_pay;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::{round_currency, Money, Percent};
use crate::FinCalcResult;

fn default_max_health_dependents() -> u32 {
    3
}

/// Insured-salary scale: the salary is clamped to `[floor, cap]` and then
/// raised to the first grade at or above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsuredScale {
    pub floor: Money,
    pub cap: Money,
    /// Ascending grade amounts. Empty means the clamped salary is insured as is.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grades: Vec<Money>,
}

impl InsuredScale {
    pub fn insured(&self, salary: Money) -> Money {
        let clamped = salary.max(self.floor).min(self.cap);
        self.grades
            .iter()
            .copied()
            .find(|&grade| grade >= clamped)
            .unwrap_or(clamped)
    }

    fn validate(&self, table: &str) -> FinCalcResult<()> {
        let field = |name: &str| format!("{table}.scale.{name}");
        if self.floor < Decimal::ZERO {
            return Err(FinCalcError::invalid(field("floor"), "Cannot be negative"));
        }
        if self.cap < self.floor {
            return Err(FinCalcError::invalid(field("cap"), "Cap must be at least the floor"));
        }
        if self.grades.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FinCalcError::invalid(
                field("grades"),
                "Grades must be strictly ascending",
            ));
        }
        Ok(())
    }
}

/// A premium split between employer and employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PremiumRule {
    pub rate_pct: Percent,
    /// Part of the premium borne by the employee.
    pub employee_share_pct: Percent,
    pub scale: InsuredScale,
}

impl PremiumRule {
    /// Employee premium for `insured_units` people insured on `salary`.
    pub fn employee_premium(&self, salary: Money, insured_units: u32) -> Money {
        round_currency(
            self.scale.insured(salary) * self.rate_pct / dec!(100) * self.employee_share_pct
                / dec!(100)
                * Decimal::from(insured_units),
        )
    }

    fn validate(&self, table: &str) -> FinCalcResult<()> {
        percent(self.rate_pct, &format!("{table}.rate_pct"))?;
        percent(self.employee_share_pct, &format!("{table}.employee_share_pct"))?;
        self.scale.validate(table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PensionRule {
    /// Mandatory employer contribution.
    pub employer_rate_pct: Percent,
    /// Highest voluntary employee contribution.
    pub max_self_rate_pct: Percent,
    pub scale: InsuredScale,
}

impl PensionRule {
    fn validate(&self) -> FinCalcResult<()> {
        percent(self.employer_rate_pct, "labor_pension.employer_rate_pct")?;
        percent(self.max_self_rate_pct, "labor_pension.max_self_rate_pct")?;
        self.scale.validate("labor_pension")
    }
}

/// Premium rates and insured-salary scales for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalaryTables {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    pub labor_insurance: PremiumRule,
    pub health_insurance: PremiumRule,
    pub labor_pension: PensionRule,
    /// Dependents beyond this count are insured free of charge.
    #[serde(default = "default_max_health_dependents")]
    pub max_health_dependents: u32,
}

impl SalaryTables {
    pub fn validate(&self) -> FinCalcResult<()> {
        self.labor_insurance.validate("labor_insurance")?;
        self.health_insurance.validate("health_insurance")?;
        self.labor_pension.validate()
    }
}

fn percent(value: Percent, field: &str) -> FinCalcResult<()> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(FinCalcError::invalid(field, "Must be between 0 and 100 percent"));
    }
    Ok(())
}
