#![cfg(feature = "mortgage")]

use fincalc_core::mortgage::amortization::{self, LoanParameters};
use fincalc_core::mortgage::early_repayment::{
    self, EarlyRepaymentInput, ExtraPaymentMode, RepaymentStrategy,
};
use fincalc_core::mortgage::refinance::{self, RefinanceInput};
use fincalc_core::FinCalcError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization
// ===========================================================================

fn loan(principal: Decimal, rate: Decimal, years: Decimal) -> LoanParameters {
    LoanParameters {
        principal,
        annual_rate_pct: rate,
        term_years: years,
        grace_period_years: Decimal::ZERO,
        include_schedule: false,
    }
}

#[test]
fn test_ten_million_thirty_years() {
    // 10,000,000 at 2.15% over 30 years: about 37,700 a month
    let out = amortization::calculate_mortgage(&loan(dec!(10_000_000), dec!(2.15), dec!(30))).unwrap();
    let r = &out.result;
    assert_eq!(r.monthly_payment, dec!(37_717));
    assert!((r.monthly_payment - dec!(37_700)).abs() <= dec!(50));
    assert_eq!(r.total_months, 360);
    assert_eq!(r.total_payment, dec!(37_717) * dec!(360));
    assert_eq!(r.total_interest, r.total_payment - dec!(10_000_000));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_grace_period_is_reported_and_warned() {
    let mut params = loan(dec!(10_000_000), dec!(2.15), dec!(30));
    params.grace_period_years = dec!(3);
    let out = amortization::calculate_mortgage(&params).unwrap();
    let r = &out.result;
    assert_eq!(r.grace_period_payment, Some(dec!(17_917)));
    assert_eq!(r.grace_months, 36);
    assert_eq!(r.repayment_months, 324);
    assert!(r.monthly_payment > dec!(37_717));
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_schedule_repays_principal() {
    let mut params = loan(dec!(1_000_000), dec!(3), dec!(10));
    params.include_schedule = true;
    let r = amortization::calculate_mortgage(&params).unwrap().result;
    let schedule = r.schedule.expect("schedule requested");
    assert_eq!(schedule.len(), 120);
    assert_eq!(schedule.last().unwrap().balance, Decimal::ZERO);
    let repaid: Decimal = schedule.iter().map(|row| row.principal).sum();
    assert_eq!(repaid, dec!(1_000_000));
}

#[test]
fn test_loan_parameters_from_json() {
    let params: LoanParameters = serde_json::from_str(
        r#"{"principal": "5000000", "annual_rate_pct": 2.0, "term_years": 20}"#,
    )
    .unwrap();
    let r = amortization::calculate_mortgage(&params).unwrap().result;
    assert_eq!(r.monthly_payment, dec!(25_294));
    assert_eq!(r.total_interest, dec!(1_070_560));

    let typo = serde_json::from_str::<LoanParameters>(
        r#"{"principal": 1, "annual_rate": 2.0, "term_years": 20}"#,
    );
    assert!(typo.is_err());
}

#[test]
fn test_fractional_month_term_rejected() {
    let err = amortization::monthly_payment(dec!(1_000_000), dec!(2), dec!(1.05)).unwrap_err();
    assert!(matches!(err, FinCalcError::InvalidInput { .. }));
}

// ===========================================================================
// Early repayment
// ===========================================================================

fn early(extra: Decimal, mode: ExtraPaymentMode) -> EarlyRepaymentInput {
    EarlyRepaymentInput {
        current_balance: dec!(5_000_000),
        annual_rate_pct: dec!(2),
        remaining_years: dec!(20),
        extra_payment: extra,
        mode,
        strategy: None,
    }
}

#[test]
fn test_lump_sum_evaluates_both_strategies() {
    let r = early_repayment::analyze_early_repayment(&early(dec!(1_000_000), ExtraPaymentMode::LumpSum))
        .unwrap()
        .result;
    assert_eq!(r.original_monthly, dec!(25_294));
    assert_eq!(r.original_months, 240);

    let shorten = r.shorten_term.expect("shorten-term evaluated");
    assert_eq!(shorten.new_months, 184);
    assert_eq!(shorten.months_saved, 56);
    assert!(shorten.saved_interest > Decimal::ZERO);

    let reduce = r.reduce_payment.expect("reduce-payment evaluated");
    assert_eq!(reduce.new_monthly_payment, dec!(20_235));
    assert_eq!(reduce.monthly_savings, dec!(5_059));

    // Paying the same extra amount saves more interest by shortening.
    assert!(shorten.saved_interest > reduce.saved_interest);
}

#[test]
fn test_recurring_extra_shortens_term() {
    let mut input = early(dec!(5_000), ExtraPaymentMode::RecurringMonthly);
    input.strategy = Some(RepaymentStrategy::ShortenTerm);
    let r = early_repayment::analyze_early_repayment(&input).unwrap().result;
    assert!(r.reduce_payment.is_none());
    let shorten = r.shorten_term.unwrap();
    assert!(shorten.new_months < 240);
    assert!(shorten.new_total_interest < r.original_total_interest);
}

#[test]
fn test_zero_extra_changes_nothing() {
    let r = early_repayment::analyze_early_repayment(&early(Decimal::ZERO, ExtraPaymentMode::LumpSum))
        .unwrap()
        .result;
    let shorten = r.shorten_term.unwrap();
    let reduce = r.reduce_payment.unwrap();
    assert_eq!(shorten.new_months, r.original_months);
    assert_eq!(shorten.saved_interest, Decimal::ZERO);
    assert_eq!(reduce.new_monthly_payment, r.original_monthly);
    assert_eq!(reduce.saved_interest, Decimal::ZERO);
}

#[test]
fn test_payment_below_interest_is_infeasible() {
    // 1,000,000 at 12% accrues 10,000 a month.
    let err = early_repayment::months_to_payoff(dec!(1_000_000), dec!(12), dec!(10_000)).unwrap_err();
    assert!(matches!(err, FinCalcError::InfeasibleRepayment { .. }));
    let err = early_repayment::months_to_payoff(dec!(1_000_000), dec!(12), dec!(9_000)).unwrap_err();
    assert!(matches!(err, FinCalcError::InfeasibleRepayment { .. }));
    assert!(early_repayment::months_to_payoff(dec!(1_000_000), dec!(12), dec!(10_001)).is_ok());
}

// ===========================================================================
// Refinance
// ===========================================================================

#[test]
fn test_refinance_rate_cut() {
    let input = RefinanceInput {
        current_balance: dec!(8_000_000),
        current_rate_pct: dec!(2.5),
        remaining_years: dec!(20),
        new_rate_pct: dec!(1.8),
        new_years: Some(dec!(20)),
        refinance_cost: dec!(30_000),
    };
    let r = refinance::evaluate_refinance(&input).unwrap().result;
    assert_eq!(r.current_monthly, dec!(42_392));
    assert_eq!(r.new_monthly, dec!(39_717));
    assert_eq!(r.monthly_savings, dec!(2_675));
    assert_eq!(r.total_savings, dec!(642_000));
    assert_eq!(r.net_savings, dec!(612_000));
    assert_eq!(r.break_even_months, Some(12));
    assert!(r.is_worth_it);
}
