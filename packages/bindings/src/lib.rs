use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use fincalc_core::FinCalcResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse `input_json`, run `kernel` and serialize its output.
fn call<I, O, F>(input_json: &str, kernel: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> FinCalcResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = kernel(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Named operations
// ---------------------------------------------------------------------------

/// Run any registered operation by id, e.g. `mortgage.calculate`.
#[napi]
pub fn invoke(operation_id: String, params_json: String) -> NapiResult<String> {
    let params: serde_json::Value = serde_json::from_str(&params_json).map_err(to_napi_error)?;
    let output =
        fincalc_core::operations::invoke(&operation_id, params).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn list_operations() -> NapiResult<String> {
    serde_json::to_string(&fincalc_core::operations::list_operations()).map_err(to_napi_error)
}

#[napi]
pub fn describe_operation(operation_id: String) -> NapiResult<String> {
    let descriptor =
        fincalc_core::operations::describe(&operation_id).map_err(to_napi_error)?;
    serde_json::to_string(&descriptor).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::mortgage::amortization::calculate_mortgage)
}

#[napi]
pub fn analyze_early_repayment(input_json: String) -> NapiResult<String> {
    call(
        &input_json,
        fincalc_core::mortgage::early_repayment::analyze_early_repayment,
    )
}

#[napi]
pub fn evaluate_refinance(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::mortgage::refinance::evaluate_refinance)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_income_tax(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::tax::income_tax::calculate_income_tax)
}

// ---------------------------------------------------------------------------
// Salary
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_net_pay(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::salary::net_pay::calculate_net_pay)
}

#[napi]
pub fn gross_from_net(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::salary::net_pay::gross_from_net)
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

#[napi]
pub fn project_capital_growth(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::growth::capital::project_capital_growth)
}

#[napi]
pub fn calculate_fire(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::growth::goals::calculate_fire)
}

#[napi]
pub fn calculate_goal_reverse(input_json: String) -> NapiResult<String> {
    call(&input_json, fincalc_core::growth::goals::calculate_goal_reverse)
}
