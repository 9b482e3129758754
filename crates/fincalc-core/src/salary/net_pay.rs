//! Take-home pay from a monthly salary, and the salary that yields a given
//! take-home.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::SalaryTables;
use crate::error::FinCalcError;
use crate::tax::brackets::compute_tax;
use crate::tax::deductions::{compute_deductions, DeductionInput};
use crate::tax::income_tax::TaxYearTables;
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Percent};
use crate::FinCalcResult;

/// Doublings of the upper search bound before giving up.
const MAX_BOUND_DOUBLINGS: u32 = 64;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalaryInput {
    pub monthly_salary: Money,
    /// Year-end bonus in months of salary. Not subject to premiums.
    #[serde(default)]
    pub bonus_months: Decimal,
    /// Health-insurance dependents of the employee.
    #[serde(default)]
    pub dependents: u32,
    /// Voluntary employee pension contribution.
    #[serde(default)]
    pub self_contribution_rate_pct: Percent,
    #[serde(default)]
    pub is_married: bool,
    pub tables: SalaryTables,
    /// Income tax on the annual salary is reported only when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_tables: Option<TaxYearTables>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuredSalaries {
    pub labor_insurance: Money,
    pub health_insurance: Money,
    pub labor_pension: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPay {
    pub gross: Money,
    pub labor_insurance: Money,
    pub health_insurance: Money,
    pub pension_employee: Money,
    /// Paid on top of the salary; not deducted.
    pub pension_employer: Money,
    pub take_home: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualPay {
    /// Twelve salaries plus the bonus.
    pub gross: Money,
    pub insurance: Money,
    pub pension_employee: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax: Option<Money>,
    /// Gross less premiums, own pension contribution and any income tax.
    pub net: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryResult {
    pub year: i32,
    pub insured: InsuredSalaries,
    pub monthly: MonthlyPay,
    pub annual: AnnualPay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_tax_rate_pct: Option<Percent>,
    /// Tax saved by contributing the maximum self rate instead of the chosen
    /// one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_saving_at_max_self_contribution: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrossFromNetInput {
    pub target_take_home: Money,
    #[serde(default)]
    pub dependents: u32,
    #[serde(default)]
    pub self_contribution_rate_pct: Percent,
    pub tables: SalaryTables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrossFromNetResult {
    pub monthly_salary: Money,
    pub take_home: Money,
    /// Salaries evaluated by the search.
    pub iterations: u32,
}

// ---------------------------------------------------------------------------
// Net pay
// ---------------------------------------------------------------------------

/// Monthly and annual take-home pay for one employee.
pub fn calculate_net_pay(input: &SalaryInput) -> FinCalcResult<ComputationOutput<SalaryResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let tables = &input.tables;
    tables.validate()?;
    if input.monthly_salary <= Decimal::ZERO {
        return Err(FinCalcError::invalid("monthly_salary", "Must be greater than zero"));
    }
    if input.bonus_months < Decimal::ZERO {
        return Err(FinCalcError::invalid("bonus_months", "Cannot be negative"));
    }
    self_rate(input.self_contribution_rate_pct, tables)?;

    let monthly = monthly_pay(
        input.monthly_salary,
        input.dependents,
        input.self_contribution_rate_pct,
        tables,
    );
    if monthly.take_home.is_zero() {
        warnings.push("Deductions on the insured salary exceed the salary".into());
    }
    if input.dependents > tables.max_health_dependents {
        warnings.push(format!(
            "Health premium charged for {} of {} dependents",
            tables.max_health_dependents, input.dependents
        ));
    }

    let annual_gross = input
        .monthly_salary
        .checked_mul(dec!(12) + input.bonus_months)
        .map(round_currency)
        .ok_or_else(|| FinCalcError::invalid("monthly_salary", "Annual salary overflows"))?;
    let insurance = (monthly.labor_insurance + monthly.health_insurance) * dec!(12);
    let pension_employee = monthly.pension_employee * dec!(12);

    let (income_tax, tax_saving_at_max_self_contribution) = match &input.tax_tables {
        Some(tax) => {
            let owed = salary_tax(annual_gross - pension_employee, input.is_married, tax)?;
            let max_rate = tables.labor_pension.max_self_rate_pct;
            let at_max = monthly_pay(input.monthly_salary, input.dependents, max_rate, tables);
            let owed_at_max = salary_tax(
                annual_gross - at_max.pension_employee * dec!(12),
                input.is_married,
                tax,
            )?;
            (Some(owed), Some((owed - owed_at_max).max(Decimal::ZERO)))
        }
        None => {
            warnings.push("No tax tables supplied; annual net excludes income tax".into());
            (None, None)
        }
    };

    let effective_tax_rate_pct = income_tax.map(|tax| {
        if annual_gross.is_zero() {
            Decimal::ZERO
        } else {
            (tax / annual_gross * dec!(100)).round_dp(2)
        }
    });
    let net = annual_gross - insurance - pension_employee - income_tax.unwrap_or(Decimal::ZERO);

    let output = SalaryResult {
        year: tables.year,
        insured: InsuredSalaries {
            labor_insurance: tables.labor_insurance.scale.insured(input.monthly_salary),
            health_insurance: tables.health_insurance.scale.insured(input.monthly_salary),
            labor_pension: tables.labor_pension.scale.insured(input.monthly_salary),
        },
        monthly,
        annual: AnnualPay {
            gross: annual_gross,
            insurance,
            pension_employee,
            income_tax,
            net,
        },
        effective_tax_rate_pct,
        tax_saving_at_max_self_contribution,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Graded insured-salary premiums and pension, annual tax on salary less own contribution",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Monthly deductions and take-home for `salary`. Take-home is floored at
/// zero when premiums on the insured floor exceed a small salary.
fn monthly_pay(
    salary: Money,
    dependents: u32,
    self_rate_pct: Percent,
    tables: &SalaryTables,
) -> MonthlyPay {
    let labor_insurance = tables.labor_insurance.employee_premium(salary, 1);
    let health_units = dependents.min(tables.max_health_dependents).saturating_add(1);
    let health_insurance = tables.health_insurance.employee_premium(salary, health_units);

    let pension = &tables.labor_pension;
    let pension_salary = pension.scale.insured(salary);
    let pension_employer = round_currency(pension_salary * pension.employer_rate_pct / dec!(100));
    let pension_employee = round_currency(pension_salary * self_rate_pct / dec!(100));

    MonthlyPay {
        gross: salary,
        labor_insurance,
        health_insurance,
        pension_employee,
        pension_employer,
        take_home: (salary - labor_insurance - health_insurance - pension_employee)
            .max(Decimal::ZERO),
    }
}

fn salary_tax(taxable_salary: Money, is_married: bool, tax: &TaxYearTables) -> FinCalcResult<Money> {
    let household = DeductionInput {
        gross_income: taxable_salary,
        salary_income: None,
        is_married,
        dependents_under_70: 0,
        dependents_over_70: 0,
        itemized_deductions: None,
    };
    let deductions = compute_deductions(&household, &tax.deductions)?;
    Ok(compute_tax(taxable_salary, deductions.total_deductions, &tax.brackets))
}

fn self_rate(rate_pct: Percent, tables: &SalaryTables) -> FinCalcResult<()> {
    let max = tables.labor_pension.max_self_rate_pct;
    if rate_pct < Decimal::ZERO || rate_pct > max {
        return Err(FinCalcError::invalid(
            "self_contribution_rate_pct",
            format!("Must be between 0 and {max} percent"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Gross from net
// ---------------------------------------------------------------------------

/// Lowest whole-unit monthly salary whose take-home reaches the target.
///
/// Take-home falls slightly each time the salary crosses into a higher
/// insured grade, so the search returns the crossing found by bisection
/// between a salary below the target and one above it.
pub fn gross_from_net(
    input: &GrossFromNetInput,
) -> FinCalcResult<ComputationOutput<GrossFromNetResult>> {
    let start = Instant::now();
    let tables = &input.tables;
    tables.validate()?;
    if input.target_take_home <= Decimal::ZERO {
        return Err(FinCalcError::invalid("target_take_home", "Must be greater than zero"));
    }
    self_rate(input.self_contribution_rate_pct, tables)?;

    let target = input.target_take_home;
    let rate = input.self_contribution_rate_pct;
    let take_home = |salary: Money| monthly_pay(salary, input.dependents, rate, tables).take_home;

    let mut iterations = 1;
    let mut low = target.floor();
    let monthly_salary = if take_home(low) >= target {
        low
    } else {
        let mut high = target
            .checked_mul(dec!(1.5))
            .ok_or_else(|| FinCalcError::invalid("target_take_home", "Target is too large"))?
            .max(dec!(300_000))
            .ceil();
        let mut doublings = 0;
        while take_home(high) < target {
            doublings += 1;
            high = high
                .checked_mul(dec!(2))
                .filter(|_| doublings <= MAX_BOUND_DOUBLINGS)
                .ok_or_else(|| {
                    FinCalcError::invalid("target_take_home", "No salary reaches this take-home")
                })?;
        }
        iterations += 1 + doublings;

        // take_home(low) < target <= take_home(high)
        while high - low > Decimal::ONE {
            let mid = ((low + high) / dec!(2)).floor();
            if take_home(mid) >= target {
                high = mid;
            } else {
                low = mid;
            }
            iterations += 1;
        }
        high
    };

    let output = GrossFromNetResult {
        monthly_salary,
        take_home: take_home(monthly_salary),
        iterations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bisection on whole-unit monthly salary",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salary::{InsuredScale, PremiumRule};

    fn tables_2025() -> SalaryTables {
        serde_yaml::from_str(include_str!("../../../../config/salary-2025.yaml")).unwrap()
    }

    fn tax_2025() -> TaxYearTables {
        serde_yaml::from_str(include_str!("../../../../config/tax-2025.yaml")).unwrap()
    }

    fn input(salary: Decimal) -> SalaryInput {
        SalaryInput {
            monthly_salary: salary,
            bonus_months: Decimal::ZERO,
            dependents: 0,
            self_contribution_rate_pct: Decimal::ZERO,
            is_married: false,
            tables: tables_2025(),
            tax_tables: None,
        }
    }

    #[test]
    fn test_monthly_deductions_on_graded_salaries() {
        let r = calculate_net_pay(&input(dec!(50_000))).unwrap().result;
        assert_eq!(r.insured.labor_insurance, dec!(45_800));
        assert_eq!(r.insured.health_insurance, dec!(50_600));
        assert_eq!(r.insured.labor_pension, dec!(50_600));
        // 45,800 × 12% × 20% = 1,099.2
        assert_eq!(r.monthly.labor_insurance, dec!(1_099));
        // 50,600 × 5.17% × 30% = 784.806
        assert_eq!(r.monthly.health_insurance, dec!(785));
        assert_eq!(r.monthly.pension_employer, dec!(3_036));
        assert_eq!(r.monthly.pension_employee, Decimal::ZERO);
        assert_eq!(r.monthly.take_home, dec!(48_116));
    }

    #[test]
    fn test_self_contribution_reduces_take_home() {
        let mut i = input(dec!(50_000));
        i.self_contribution_rate_pct = dec!(6);
        let r = calculate_net_pay(&i).unwrap().result;
        assert_eq!(r.monthly.pension_employee, dec!(3_036));
        assert_eq!(r.monthly.take_home, dec!(45_080));
        assert_eq!(r.annual.pension_employee, dec!(36_432));
    }

    #[test]
    fn test_health_dependents_are_capped() {
        let mut three = input(dec!(50_000));
        three.dependents = 3;
        let mut five = input(dec!(50_000));
        five.dependents = 5;
        let r3 = calculate_net_pay(&three).unwrap();
        let r5 = calculate_net_pay(&five).unwrap();
        // 50,600 × 5.17% × 30% × 4 = 3,139.22
        assert_eq!(r3.result.monthly.health_insurance, dec!(3_139));
        assert_eq!(r5.result.monthly.health_insurance, dec!(3_139));
        assert!(r5.warnings.iter().any(|w| w.contains("3 of 5")));
    }

    #[test]
    fn test_salary_below_floor_is_insured_at_floor() {
        let r = calculate_net_pay(&input(dec!(20_000))).unwrap().result;
        assert_eq!(r.insured.labor_insurance, dec!(28_590));
        assert_eq!(r.insured.health_insurance, dec!(28_590));
        assert_eq!(r.monthly.take_home, dec!(20_000) - dec!(686) - dec!(443));
    }

    #[test]
    fn test_annual_totals_with_bonus_and_tax() {
        let mut i = input(dec!(50_000));
        i.bonus_months = dec!(2);
        i.tax_tables = Some(tax_2025());
        let out = calculate_net_pay(&i).unwrap();
        let r = out.result;
        assert_eq!(r.annual.gross, dec!(700_000));
        assert_eq!(r.annual.insurance, (dec!(1_099) + dec!(785)) * dec!(12));
        let tax = r.annual.income_tax.unwrap();
        assert!(tax > Decimal::ZERO);
        assert_eq!(r.annual.net, r.annual.gross - r.annual.insurance - tax);
        assert_eq!(
            r.effective_tax_rate_pct,
            Some((tax / dec!(700_000) * dec!(100)).round_dp(2))
        );
        assert!(r.tax_saving_at_max_self_contribution.unwrap() > Decimal::ZERO);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_without_tax_tables_warns() {
        let out = calculate_net_pay(&input(dec!(50_000))).unwrap();
        assert_eq!(out.result.annual.income_tax, None);
        assert_eq!(out.result.annual.net, out.result.monthly.take_home * dec!(12));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_net_pay_invalid_inputs() {
        let mut i = input(dec!(50_000));
        i.self_contribution_rate_pct = dec!(7);
        let err = calculate_net_pay(&i).unwrap_err();
        assert!(matches!(&err, FinCalcError::InvalidInput { field, .. } if field == "self_contribution_rate_pct"));

        assert!(calculate_net_pay(&input(Decimal::ZERO)).is_err());

        let mut i = input(dec!(50_000));
        i.bonus_months = dec!(-1);
        assert!(calculate_net_pay(&i).is_err());
    }

    fn reverse(target: Decimal) -> GrossFromNetInput {
        GrossFromNetInput {
            target_take_home: target,
            dependents: 0,
            self_contribution_rate_pct: Decimal::ZERO,
            tables: tables_2025(),
        }
    }

    #[test]
    fn test_gross_from_net_inverts_net_pay() {
        let r = gross_from_net(&reverse(dec!(48_116))).unwrap().result;
        assert_eq!(r.monthly_salary, dec!(50_000));
        assert_eq!(r.take_home, dec!(48_116));
        assert!(r.iterations > 1);
    }

    #[test]
    fn test_gross_from_net_is_minimal_at_the_crossing() {
        let target = dec!(48_117);
        let r = gross_from_net(&reverse(target)).unwrap().result;
        assert!(r.take_home >= target);
        let below = calculate_net_pay(&input(r.monthly_salary - Decimal::ONE)).unwrap().result;
        assert!(below.monthly.take_home < target);
    }

    #[test]
    fn test_gross_from_net_above_every_cap() {
        // Above the top grades the deductions are fixed at 1,099 + 3,404.
        let r = gross_from_net(&reverse(dec!(800_000))).unwrap().result;
        assert_eq!(r.monthly_salary, dec!(804_503));
        assert_eq!(r.take_home, dec!(800_000));
    }

    #[test]
    fn test_gross_from_net_gives_up_when_nothing_is_left() {
        let mut input = reverse(dec!(10_000));
        input.tables.labor_insurance = PremiumRule {
            rate_pct: dec!(100),
            employee_share_pct: dec!(100),
            scale: InsuredScale {
                floor: Decimal::ZERO,
                cap: Decimal::MAX,
                grades: Vec::new(),
            },
        };
        let err = gross_from_net(&input).unwrap_err();
        assert!(matches!(&err, FinCalcError::InvalidInput { field, .. } if field == "target_take_home"));
    }

    #[test]
    fn test_gross_from_net_rejects_non_positive_target() {
        assert!(gross_from_net(&reverse(Decimal::ZERO)).is_err());
    }
}
