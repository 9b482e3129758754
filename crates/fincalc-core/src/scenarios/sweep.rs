//! One-axis scenario sweeps.
//!
//! A sweep copies a base parameter record, overrides one field with each
//! value on the axis in turn and calls a kernel function on the result. Rows
//! come back in axis order; every value costs exactly one kernel call.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, ScenarioAxis};
use crate::FinCalcResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow<R> {
    /// Position of `value` on the axis.
    pub index: usize,
    pub value: Decimal,
    pub result: R,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutput<R> {
    pub parameter_name: String,
    pub rows: Vec<SweepRow<R>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_index: Option<usize>,
}

/// Sweep `axis` over a serializable parameter record.
///
/// The override is applied on the record's JSON form and the record is
/// deserialized again, so the usual input validation (including unknown
/// field rejection) applies to every row.
pub fn sweep<P, R, F>(
    base: &P,
    axis: &ScenarioAxis,
    kernel: F,
) -> FinCalcResult<ComputationOutput<SweepOutput<R>>>
where
    P: Serialize + DeserializeOwned,
    R: Serialize,
    F: Fn(&P) -> FinCalcResult<R>,
{
    let base_value = serde_json::to_value(base)?;
    run(axis, &base_value, |value| {
        let mut params = base_value.clone();
        set_parameter(&mut params, &axis.parameter_name, value)?;
        let record: P = serde_json::from_value(params)
            .map_err(|e| FinCalcError::invalid(axis.parameter_name.as_str(), e.to_string()))?;
        kernel(&record)
    })
}

/// Typed sweep: `apply` writes each axis value into a clone of `base`.
pub fn sweep_with<P, R, A, F>(
    base: &P,
    axis: &ScenarioAxis,
    apply: A,
    kernel: F,
) -> FinCalcResult<ComputationOutput<SweepOutput<R>>>
where
    P: Clone + Serialize,
    R: Serialize,
    A: Fn(&mut P, Decimal),
    F: Fn(&P) -> FinCalcResult<R>,
{
    let base_value = serde_json::to_value(base)?;
    run(axis, &base_value, |value| {
        let mut record = base.clone();
        apply(&mut record, value);
        kernel(&record)
    })
}

/// Sweep over an untyped parameter object, as used by operation dispatch.
pub fn sweep_json<F>(
    base: &Value,
    axis: &ScenarioAxis,
    kernel: F,
) -> FinCalcResult<ComputationOutput<SweepOutput<Value>>>
where
    F: Fn(Value) -> FinCalcResult<Value>,
{
    run(axis, base, |value| {
        let mut params = base.clone();
        set_parameter(&mut params, &axis.parameter_name, value)?;
        kernel(params)
    })
}

fn run<R, F>(
    axis: &ScenarioAxis,
    base: &Value,
    eval: F,
) -> FinCalcResult<ComputationOutput<SweepOutput<R>>>
where
    R: Serialize,
    F: Fn(Decimal) -> FinCalcResult<R>,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if axis.parameter_name.trim().is_empty() {
        return Err(FinCalcError::invalid("parameter_name", "Parameter name is empty"));
    }
    if axis.values.is_empty() {
        return Err(FinCalcError::invalid(
            format!("axis:{}", axis.parameter_name),
            "Axis has no values",
        ));
    }
    debug!(
        parameter = %axis.parameter_name,
        values = axis.values.len(),
        "running scenario sweep"
    );

    let rows = axis
        .values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            eval(value).map(|result| SweepRow {
                index,
                value,
                result,
            })
        })
        .collect::<FinCalcResult<Vec<_>>>()?;

    let baseline_index = axis
        .baseline
        .and_then(|b| axis.values.iter().position(|&v| v == b));
    if let (Some(baseline), None) = (axis.baseline, baseline_index) {
        warnings.push(format!(
            "Baseline {baseline} is not one of the swept values of {}",
            axis.parameter_name
        ));
    }

    let output = SweepOutput {
        parameter_name: axis.parameter_name.clone(),
        rows,
        baseline_index,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-axis scenario sweep",
        &serde_json::json!({
            "parameter_name": axis.parameter_name,
            "values": axis.values,
            "base": base,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Write `value` at a dotted `path` inside a JSON object.
///
/// Intermediate segments must already exist and be objects; the last
/// segment may be new. Integral values are written as JSON integers so
/// count fields still deserialize, everything else as a decimal string.
pub fn set_parameter(params: &mut Value, path: &str, value: Decimal) -> FinCalcResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(FinCalcError::invalid(path, "Malformed parameter path"));
    }
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| FinCalcError::invalid(path, "Malformed parameter path"))?;

    let mut node = params;
    for segment in parents {
        node = node
            .get_mut(*segment)
            .filter(|child| child.is_object())
            .ok_or_else(|| {
                FinCalcError::invalid(path, format!("'{segment}' is not an object in the parameters"))
            })?;
    }

    let object = node
        .as_object_mut()
        .ok_or_else(|| FinCalcError::invalid(path, "Parameters must be an object"))?;
    object.insert((*last).to_string(), decimal_to_json(value));
    Ok(())
}

fn decimal_to_json(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(int) = value.to_i64() {
            return Value::from(int);
        }
    }
    Value::String(value.normalize().to_string())
}
