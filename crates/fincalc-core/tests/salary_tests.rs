#![cfg(feature = "salary")]

use fincalc_core::salary::net_pay::{
    calculate_net_pay, gross_from_net, GrossFromNetInput, SalaryInput,
};
use fincalc_core::salary::SalaryTables;
use fincalc_core::tax::income_tax::TaxYearTables;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SALARY_2024: &str = include_str!("../../../config/salary-2024.yaml");
const SALARY_2025: &str = include_str!("../../../config/salary-2025.yaml");

fn tables(yaml: &str) -> SalaryTables {
    serde_yaml::from_str(yaml).expect("bundled salary tables parse")
}

fn tax_2025() -> TaxYearTables {
    serde_yaml::from_str(include_str!("../../../config/tax-2025.yaml")).expect("tax tables parse")
}

fn salary(monthly: Decimal, yaml: &str) -> SalaryInput {
    SalaryInput {
        monthly_salary: monthly,
        bonus_months: Decimal::ZERO,
        dependents: 0,
        self_contribution_rate_pct: Decimal::ZERO,
        is_married: false,
        tables: tables(yaml),
        tax_tables: None,
    }
}

// ===========================================================================
// Bundled tables
// ===========================================================================

#[test]
fn test_bundled_tables_validate() {
    for yaml in [SALARY_2024, SALARY_2025] {
        let t = tables(yaml);
        t.validate().unwrap();
        assert_eq!(t.max_health_dependents, 3);
        assert_eq!(t.labor_pension.max_self_rate_pct, dec!(6));
    }
    assert!(tables(SALARY_2024).labor_insurance.scale.grades.is_empty());
    assert_eq!(tables(SALARY_2025).labor_pension.scale.grades.last(), Some(&dec!(150_000)));
}

#[test]
fn test_clamp_only_scales_of_2024() {
    let r = calculate_net_pay(&salary(dec!(50_000), SALARY_2024)).unwrap().result;
    assert_eq!(r.year, 2024);
    assert_eq!(r.insured.labor_insurance, dec!(45_800));
    assert_eq!(r.insured.health_insurance, dec!(50_000));
    // 45,800 × 11.5% × 20% = 1,053.4; 50,000 × 5.17% × 30% = 775.5
    assert_eq!(r.monthly.labor_insurance, dec!(1_053));
    assert_eq!(r.monthly.health_insurance, dec!(776));
    assert_eq!(r.monthly.pension_employer, dec!(3_000));
    assert_eq!(r.monthly.take_home, dec!(48_171));
}

#[test]
fn test_graded_2025_costs_more_than_2024() {
    let y2024 = calculate_net_pay(&salary(dec!(50_000), SALARY_2024)).unwrap().result;
    let y2025 = calculate_net_pay(&salary(dec!(50_000), SALARY_2025)).unwrap().result;
    assert_eq!(y2025.monthly.take_home, dec!(48_116));
    assert_eq!(y2024.monthly.take_home - y2025.monthly.take_home, dec!(55));
}

#[test]
fn test_high_salary_hits_every_cap() {
    let r = calculate_net_pay(&salary(dec!(300_000), SALARY_2025)).unwrap().result;
    assert_eq!(r.insured.labor_insurance, dec!(45_800));
    assert_eq!(r.insured.health_insurance, dec!(219_500));
    assert_eq!(r.insured.labor_pension, dec!(150_000));
    assert_eq!(r.monthly.pension_employer, dec!(9_000));
}

#[test]
fn test_self_contribution_saves_tax() {
    let mut chosen = salary(dec!(120_000), SALARY_2025);
    chosen.bonus_months = dec!(2);
    chosen.tax_tables = Some(tax_2025());
    let none = calculate_net_pay(&chosen).unwrap().result;

    chosen.self_contribution_rate_pct = dec!(6);
    let max = calculate_net_pay(&chosen).unwrap().result;

    let saving = none.tax_saving_at_max_self_contribution.unwrap();
    assert_eq!(saving, none.annual.income_tax.unwrap() - max.annual.income_tax.unwrap());
    assert!(saving > Decimal::ZERO);
    assert_eq!(max.tax_saving_at_max_self_contribution, Some(Decimal::ZERO));
}

#[test]
fn test_gross_from_net_round_trips_across_salaries() {
    for monthly in [dec!(35_000), dec!(62_345), dec!(100_000)] {
        let net = calculate_net_pay(&salary(monthly, SALARY_2025)).unwrap().result;
        let search = GrossFromNetInput {
            target_take_home: net.monthly.take_home,
            dependents: 0,
            self_contribution_rate_pct: Decimal::ZERO,
            tables: tables(SALARY_2025),
        };
        let found = gross_from_net(&search).unwrap().result;
        assert_eq!(found.monthly_salary, monthly);
        assert_eq!(found.take_home, net.monthly.take_home);
    }
}
