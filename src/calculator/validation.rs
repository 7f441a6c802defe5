//! Validation flow for a calculator form submission.
//!
//! Checks run in a fixed order and stop at the first failure; every failure
//! leaves as an [`ErrorRecord`].

use {anyhow::Result as AnyhowResult, tracing::debug};

use crate::{
    calculator::operator::Operator,
    error::{
        normalizer::normalize,
        taxonomy::{ErrorRecord, Operand},
    },
};

/// Largest integer magnitude an `f64` represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Stand-in for an empty field in invalid-input records.
pub const EMPTY_INPUT_MARKER: &str = "(empty)";

const PARSING_OPERATION: &str = "parsing";

/// Validates and evaluates `raw_a operator raw_b`.
///
/// # Arguments
///
/// * `raw_a` - Raw text of the first field.
/// * `raw_b` - Raw text of the second field.
/// * `operator` - Operator symbol selected in the form.
///
/// # Returns
///
/// The numeric result.
///
/// # Errors
///
/// Returns, in order of precedence:
/// * `InvalidInput` for an empty or non-numeric field,
/// * `DivisionByZero` for `/` with a zero divisor,
/// * `UnsupportedOperation` for a symbol outside `+ - * /`,
/// * `Overflow` for an infinite result or one beyond [`MAX_SAFE_INTEGER`],
/// * `Mathematical` for a NaN result.
pub fn validate(raw_a: &str, raw_b: &str, operator: &str) -> Result<f64, ErrorRecord> {
    if raw_a.trim().is_empty() {
        return Err(ErrorRecord::invalid_input(EMPTY_INPUT_MARKER, "first number"));
    }
    if raw_b.trim().is_empty() {
        return Err(ErrorRecord::invalid_input(EMPTY_INPUT_MARKER, "second number"));
    }

    let a = parse_operand(raw_a)
        .map_err(|e| normalize(e, Some(PARSING_OPERATION), vec![raw_a.into()]))?;
    let b = parse_operand(raw_b)
        .map_err(|e| normalize(e, Some(PARSING_OPERATION), vec![raw_b.into()]))?;

    if operator == Operator::Divide.symbol() && b == 0.0 {
        return Err(ErrorRecord::division_by_zero(a));
    }

    let operands = vec![Operand::Number(a), Operand::Number(b)];
    let result =
        evaluate(operator, a, b).map_err(|e| normalize(e, Some(operator), operands.clone()))?;

    check_result(result, operator, operands)
}

/// Parses one trimmed field as a finite decimal number.
fn parse_operand(raw: &str) -> AnyhowResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ErrorRecord::invalid_input(raw, "number").into()),
    }
}

fn evaluate(symbol: &str, a: f64, b: f64) -> AnyhowResult<f64> {
    let operator: Operator = symbol.parse()?;
    Ok(operator.apply(a, b))
}

fn check_result(result: f64, operator: &str, operands: Vec<Operand>) -> Result<f64, ErrorRecord> {
    if result.is_infinite() {
        return Err(ErrorRecord::overflow(result, Some(operator), operands));
    }
    if result.is_nan() {
        return Err(ErrorRecord::mathematical(
            "Result is not a valid number",
            Some(operator),
            operands,
        ));
    }
    if result.abs() > MAX_SAFE_INTEGER {
        return Err(ErrorRecord::overflow(result, Some(operator), operands));
    }

    debug!(operator, result, "Calculation succeeded");
    Ok(result)
}
