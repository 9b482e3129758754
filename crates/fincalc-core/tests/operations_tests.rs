#![cfg(feature = "operations")]

use fincalc_core::operations::{describe, invoke, list_operations};
use fincalc_core::FinCalcError;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn tables_2025() -> Value {
    serde_yaml::from_str(include_str!("../../../config/tax-2025.yaml")).unwrap()
}

fn salary_tables_2025() -> Value {
    serde_yaml::from_str(include_str!("../../../config/salary-2025.yaml")).unwrap()
}

#[test]
fn test_registry_lists_every_operation() {
    let ids: Vec<String> = list_operations().into_iter().map(|op| op.id).collect();
    assert_eq!(
        ids,
        vec![
            "mortgage.calculate",
            "mortgage.earlyRepayment",
            "mortgage.refinance",
            "mortgage.payoffMonths",
            "tax.deductions",
            "tax.calculate",
            "capital.growth",
            "capital.fire",
            "capital.goalReverse",
            "salary.netPay",
            "salary.grossFromNet",
            "scenario.sweep",
        ]
    );
}

#[test]
fn test_schemas_name_required_parameters() {
    let op = describe("mortgage.calculate").unwrap();
    let schema = serde_json::to_value(&op.parameters).unwrap();
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["required"], json!(["principal", "annual_rate_pct", "term_years"]));
    assert!(schema["properties"]["grace_period_years"].is_object());

    let tax = serde_json::to_value(describe("tax.calculate").unwrap().parameters).unwrap();
    assert_eq!(tax["properties"]["tables"]["properties"]["brackets"]["type"], "array");
}

#[test]
fn test_invoke_mortgage() {
    let out = invoke(
        "mortgage.calculate",
        json!({"principal": 10000000, "annual_rate_pct": 2.15, "term_years": 30}),
    )
    .unwrap();
    assert_eq!(out["result"]["monthly_payment"], json!("37717"));
    assert_eq!(out["result"]["total_months"], json!(360));
    assert!(out["metadata"]["version"].is_string());
    assert_eq!(out["warnings"], json!([]));
}

#[test]
fn test_invoke_tax_with_string_decimals() {
    let out = invoke(
        "tax.calculate",
        json!({
            "household": {"gross_income": "1000000"},
            "tables": tables_2025(),
        }),
    )
    .unwrap();
    assert_eq!(out["result"]["tax"], json!("27700"));
    assert_eq!(out["result"]["bracket_index"], json!(0));
}

#[test]
fn test_invoke_deductions() {
    let tables = tables_2025();
    let out = invoke(
        "tax.deductions",
        json!({
            "household": {"gross_income": 1000000, "is_married": true},
            "table": tables["deductions"],
        }),
    )
    .unwrap();
    assert_eq!(out["result"]["standard_deduction"], json!("262000"));
    assert_eq!(out["result"]["household_size"], json!(2));
}

#[test]
fn test_invoke_growth() {
    let out = invoke(
        "capital.growth",
        json!({"initial_capital": 100000, "annual_return_pct": 5, "years": 3}),
    )
    .unwrap();
    assert_eq!(out["result"]["yearly"].as_array().map(Vec::len), Some(4));
}

#[test]
fn test_unknown_fields_are_invalid_params() {
    let err = invoke(
        "mortgage.refinance",
        json!({
            "current_balance": 8000000, "current_rate_pct": 2.5,
            "remaining_years": 20, "new_rate_pct": 1.8, "cost": 30000,
        }),
    )
    .unwrap_err();
    match err {
        FinCalcError::InvalidInput { field, reason } => {
            assert_eq!(field, "params");
            assert!(reason.contains("cost"), "{reason}");
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn test_domain_errors_pass_through() {
    let err = invoke(
        "mortgage.payoffMonths",
        json!({"balance": 1000000, "annual_rate_pct": 12, "payment": 5000}),
    )
    .unwrap_err();
    assert!(matches!(err, FinCalcError::InfeasibleRepayment { .. }));
}

#[test]
fn test_sweep_operation() {
    let out = invoke(
        "scenario.sweep",
        json!({
            "operation": "mortgage.refinance",
            "base": {
                "current_balance": 8000000, "current_rate_pct": 2.5,
                "remaining_years": 20, "new_rate_pct": 1.8, "refinance_cost": 30000,
            },
            "axis": {"parameter_name": "refinance_cost", "values": [0, 30000, 700000], "baseline": 30000},
        }),
    )
    .unwrap();
    let rows = out["result"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(out["result"]["baseline_index"], json!(1));
    assert_eq!(rows[1]["result"]["result"]["break_even_months"], json!(12));
    assert_eq!(rows[2]["result"]["result"]["is_worth_it"], json!(false));
}

#[test]
fn test_sweep_of_unknown_operation() {
    let err = invoke(
        "scenario.sweep",
        json!({
            "operation": "mortgage.unknown",
            "base": {},
            "axis": {"parameter_name": "x", "values": [1]},
        }),
    )
    .unwrap_err();
    assert!(matches!(err, FinCalcError::UnknownOperation(_)));
}

#[test]
fn test_refinance_cost_defaults_when_omitted() {
    let out = invoke(
        "mortgage.refinance",
        json!({
            "current_balance": 8000000, "current_rate_pct": 2.5,
            "remaining_years": 20, "new_rate_pct": 1.8,
        }),
    )
    .unwrap();
    assert_eq!(out["result"]["refinance_cost"], json!("30000"));
    assert_eq!(out["result"]["break_even_months"], json!(12));
}

#[test]
fn test_early_repayment_on_a_balance_too_small_to_amortize() {
    let err = invoke(
        "mortgage.earlyRepayment",
        json!({
            "current_balance": 100, "annual_rate_pct": 2,
            "remaining_years": 30, "extra_payment": 50,
        }),
    )
    .unwrap_err();
    match err {
        FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "current_balance"),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

// ===========================================================================
// Salary and savings goals
// ===========================================================================

#[test]
fn test_invoke_net_pay() {
    let out = invoke(
        "salary.netPay",
        json!({
            "monthly_salary": 50000,
            "bonus_months": 2,
            "tables": salary_tables_2025(),
            "tax_tables": tables_2025(),
        }),
    )
    .unwrap();
    let result = &out["result"];
    assert_eq!(result["monthly"]["take_home"], json!("48116"));
    assert_eq!(result["annual"]["gross"], json!("700000"));
    assert!(result["annual"]["income_tax"].is_string());
    assert_eq!(out["warnings"], json!([]));
}

#[test]
fn test_invoke_gross_from_net() {
    let out = invoke(
        "salary.grossFromNet",
        json!({"target_take_home": 48116, "tables": salary_tables_2025()}),
    )
    .unwrap();
    assert_eq!(out["result"]["monthly_salary"], json!("50000"));
    assert_eq!(out["result"]["take_home"], json!("48116"));
}

#[test]
fn test_invoke_fire_with_defaults() {
    let out = invoke(
        "capital.fire",
        json!({"monthly_expense": 50000, "current_savings": 3000000, "monthly_investment": 30000}),
    )
    .unwrap();
    assert_eq!(out["result"]["fire_number"], json!("15000000"));
    assert_eq!(out["assumptions"]["safe_withdrawal_rate_pct"], json!("4"));
    assert_eq!(out["assumptions"]["target_years"], json!(20));
    assert!(out["result"]["years_to_fire"].is_u64());
}

#[test]
fn test_invoke_goal_reverse() {
    let out = invoke(
        "capital.goalReverse",
        json!({"target_amount": 2400000, "years": 10, "expected_return_pct": 0}),
    )
    .unwrap();
    assert_eq!(out["result"]["monthly_investment"], json!("20000"));
    assert_eq!(out["result"]["total_interest"], json!("0"));
}

#[test]
fn test_salary_sweep_over_dependents() {
    let out = invoke(
        "scenario.sweep",
        json!({
            "operation": "salary.netPay",
            "base": {"monthly_salary": 50000, "tables": salary_tables_2025()},
            "axis": {"parameter_name": "dependents", "values": [0, 1, 3, 5]},
        }),
    )
    .unwrap();
    let rows = out["result"]["rows"].as_array().unwrap();
    let health: Vec<&Value> = rows
        .iter()
        .map(|row| &row["result"]["result"]["monthly"]["health_insurance"])
        .collect();
    assert_eq!(health, vec![&json!("785"), &json!("1570"), &json!("3139"), &json!("3139")]);
}
