//! Exemptions and deductions that reduce gross income to taxable income.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::Money;
use crate::FinCalcResult;

fn default_senior_multiplier() -> Decimal {
    dec!(1.5)
}

/// Household facts that drive exemptions and deductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeductionInput {
    pub gross_income: Money,
    /// Salary part of gross income; all of it when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_income: Option<Money>,
    #[serde(default)]
    pub is_married: bool,
    #[serde(default)]
    pub dependents_under_70: u32,
    #[serde(default)]
    pub dependents_over_70: u32,
    /// Itemized deductions, used instead of the standard deduction when larger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itemized_deductions: Option<Money>,
}

/// Per-year deduction amounts. Supplied as configuration, never hard-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeductionTable {
    pub exemption_per_person: Money,
    pub standard_deduction_single: Money,
    pub salary_special_deduction_cap: Money,
    pub basic_living_expense_per_person: Money,
    /// Exemption multiplier for dependents aged 70 or over.
    #[serde(default = "default_senior_multiplier")]
    pub senior_exemption_multiplier: Decimal,
}

impl DeductionTable {
    pub fn validate(&self) -> FinCalcResult<()> {
        let amounts = [
            ("exemption_per_person", self.exemption_per_person),
            ("standard_deduction_single", self.standard_deduction_single),
            ("salary_special_deduction_cap", self.salary_special_deduction_cap),
            ("basic_living_expense_per_person", self.basic_living_expense_per_person),
            ("senior_exemption_multiplier", self.senior_exemption_multiplier),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(FinCalcError::invalid(field, "Cannot be negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionMethod {
    Standard,
    Itemized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub exemption_total: Money,
    /// Standard or itemized amount, whichever was applied.
    pub standard_deduction: Money,
    pub deduction_method: DeductionMethod,
    pub salary_deduction: Money,
    pub basic_living_differential: Money,
    pub household_size: u32,
    pub total_deductions: Money,
}

/// Exemptions and deductions for a household under `table`.
pub fn compute_deductions(
    input: &DeductionInput,
    table: &DeductionTable,
) -> FinCalcResult<DeductionBreakdown> {
    validate_input(input)?;
    table.validate()?;

    let household_size = household_size(input)?;
    let exemption_total = Decimal::from(household_size - input.dependents_over_70)
        * table.exemption_per_person
        + Decimal::from(input.dependents_over_70)
            * table.exemption_per_person
            * table.senior_exemption_multiplier;

    let standard = if input.is_married {
        table.standard_deduction_single * dec!(2)
    } else {
        table.standard_deduction_single
    };
    let (standard_deduction, deduction_method) = match input.itemized_deductions {
        Some(itemized) if itemized > standard => (itemized, DeductionMethod::Itemized),
        _ => (standard, DeductionMethod::Standard),
    };

    let salary = input.salary_income.unwrap_or(input.gross_income);
    let salary_deduction = salary.min(table.salary_special_deduction_cap);

    let basic_living_differential = (Decimal::from(household_size)
        * table.basic_living_expense_per_person
        - (exemption_total + standard_deduction))
        .max(Decimal::ZERO);

    Ok(DeductionBreakdown {
        exemption_total,
        standard_deduction,
        deduction_method,
        salary_deduction,
        basic_living_differential,
        household_size,
        total_deductions: exemption_total
            + standard_deduction
            + salary_deduction
            + basic_living_differential,
    })
}

/// Filer, spouse and every dependent.
fn household_size(input: &DeductionInput) -> FinCalcResult<u32> {
    let too_many = |field: &str| FinCalcError::invalid(field, "Too many dependents");
    (1 + u32::from(input.is_married))
        .checked_add(input.dependents_under_70)
        .ok_or_else(|| too_many("dependents_under_70"))?
        .checked_add(input.dependents_over_70)
        .ok_or_else(|| too_many("dependents_over_70"))
}

fn validate_input(input: &DeductionInput) -> FinCalcResult<()> {
    if input.gross_income < Decimal::ZERO {
        return Err(FinCalcError::invalid("gross_income", "Cannot be negative"));
    }
    if let Some(salary) = input.salary_income {
        if salary < Decimal::ZERO {
            return Err(FinCalcError::invalid("salary_income", "Cannot be negative"));
        }
        if salary > input.gross_income {
            return Err(FinCalcError::invalid(
                "salary_income",
                "Salary income cannot exceed gross income",
            ));
        }
    }
    if input.itemized_deductions.is_some_and(|v| v < Decimal::ZERO) {
        return Err(FinCalcError::invalid("itemized_deductions", "Cannot be negative"));
    }
    Ok(())
}
