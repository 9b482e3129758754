//! Annual income tax for a household under a caller-supplied tax year.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::brackets::{net_taxable_income, tax_on_net_income, BracketTable};
use super::deductions::{compute_deductions, DeductionBreakdown, DeductionInput, DeductionTable};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::FinCalcResult;

/// Everything that changes from one tax year (or locale) to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaxYearTables {
    pub tax_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    pub brackets: BracketTable,
    pub deductions: DeductionTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomeTaxInput {
    pub household: DeductionInput,
    pub tables: TaxYearTables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    pub tax_year: i32,
    pub gross_income: Money,
    pub deductions: DeductionBreakdown,
    pub net_taxable_income: Money,
    /// Zero-based position of the applied bracket.
    pub bracket_index: usize,
    pub marginal_rate_pct: Percent,
    pub tax: Money,
    /// Tax over gross income, in percent (2 dp).
    pub effective_rate_pct: Percent,
    pub after_tax_income: Money,
}

/// Deductions, bracket and tax for one household.
pub fn calculate_income_tax(
    input: &IncomeTaxInput,
) -> FinCalcResult<ComputationOutput<IncomeTaxResult>> {
    let start = Instant::now();
    let tables = &input.tables;
    let warnings = tables.brackets.continuity_gaps();

    let deductions = compute_deductions(&input.household, &tables.deductions)?;
    let gross_income = input.household.gross_income;
    let net = net_taxable_income(gross_income, deductions.total_deductions);
    let bracket_index = tables.brackets.bracket_index(net);
    let marginal_rate_pct = tables.brackets.brackets()[bracket_index].marginal_rate_pct;
    let tax = tax_on_net_income(net, &tables.brackets);

    let effective_rate_pct = if gross_income > Decimal::ZERO {
        (tax / gross_income * dec!(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let output = IncomeTaxResult {
        tax_year: tables.tax_year,
        gross_income,
        deductions,
        net_taxable_income: net,
        bracket_index,
        marginal_rate_pct,
        tax,
        effective_rate_pct,
        after_tax_income: gross_income - tax,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Progressive income tax with cumulative deduction",
        &serde_json::json!({
            "tax_year": tables.tax_year,
            "household": input.household,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::brackets::TaxBracket;
    use rust_decimal_macros::dec;

    fn tables() -> TaxYearTables {
        let b = |upper: Option<Decimal>, rate: Decimal, deduction: Decimal| TaxBracket {
            upper_bound: upper,
            marginal_rate_pct: rate,
            cumulative_deduction: deduction,
        };
        TaxYearTables {
            tax_year: 2025,
            effective_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            brackets: BracketTable::new(vec![
                b(Some(dec!(590_000)), dec!(5), dec!(0)),
                b(Some(dec!(1_330_000)), dec!(12), dec!(41_300)),
                b(Some(dec!(2_660_000)), dec!(20), dec!(147_700)),
                b(Some(dec!(4_980_000)), dec!(30), dec!(413_700)),
                b(None, dec!(40), dec!(911_700)),
            ])
            .unwrap(),
            deductions: DeductionTable {
                exemption_per_person: dec!(97_000),
                standard_deduction_single: dec!(131_000),
                salary_special_deduction_cap: dec!(218_000),
                basic_living_expense_per_person: dec!(202_000),
                senior_exemption_multiplier: dec!(1.5),
            },
        }
    }

    fn household(gross: Decimal) -> DeductionInput {
        DeductionInput {
            gross_income: gross,
            salary_income: None,
            is_married: false,
            dependents_under_70: 0,
            dependents_over_70: 0,
            itemized_deductions: None,
        }
    }

    #[test]
    fn test_single_salary_earner() {
        let input = IncomeTaxInput {
            household: household(dec!(1_000_000)),
            tables: tables(),
        };
        let out = calculate_income_tax(&input).unwrap();
        let r = &out.result;
        // 1,000,000 − 446,000 = 554,000 at 5%
        assert_eq!(r.net_taxable_income, dec!(554_000));
        assert_eq!(r.bracket_index, 0);
        assert_eq!(r.tax, dec!(27_700));
        assert_eq!(r.effective_rate_pct, dec!(2.77));
        assert_eq!(r.after_tax_income, dec!(972_300));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_income_below_deductions_pays_nothing() {
        let input = IncomeTaxInput {
            household: household(dec!(300_000)),
            tables: tables(),
        };
        let r = calculate_income_tax(&input).unwrap().result;
        assert_eq!(r.net_taxable_income, Decimal::ZERO);
        assert_eq!(r.tax, Decimal::ZERO);
        assert_eq!(r.effective_rate_pct, Decimal::ZERO);
    }

    #[test]
    fn test_high_earner_top_bracket() {
        let input = IncomeTaxInput {
            household: household(dec!(10_000_000)),
            tables: tables(),
        };
        let r = calculate_income_tax(&input).unwrap().result;
        assert_eq!(r.bracket_index, 4);
        assert_eq!(r.marginal_rate_pct, dec!(40));
        // (10,000,000 − 446,000) × 40% − 911,700
        assert_eq!(r.tax, dec!(2_909_900));
    }

    #[test]
    fn test_tables_round_trip_through_json() {
        let json = serde_json::to_string(&tables()).unwrap();
        let back: TaxYearTables = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tables());
    }
}
