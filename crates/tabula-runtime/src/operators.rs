//! Operator execution on evaluated operands

use std::cmp::Ordering;
use tabula_core::{Operator, Value};

use crate::error::{EvaluationError, Result};

/// Execute a comparison operation
///
/// `==` and `!=` compare any two values structurally. Ordering comparisons
/// involving null are false, which lets rules over missing fields simply
/// not match.
pub(crate) fn execute_compare(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    match op {
        Operator::Eq => return Ok(left == right),
        Operator::Ne => return Ok(left != right),
        _ => {}
    }

    if left.is_null() || right.is_null() {
        tracing::debug!("Null comparison: {} {} {}, returning false", left, op, right);
        return Ok(false);
    }

    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => {
            return Err(EvaluationError::TypeError(format!(
                "cannot compare {} and {} with {}",
                left.type_name(),
                right.type_name(),
                op
            )))
        }
    };

    let Some(ordering) = ordering else {
        return Ok(false);
    };

    Ok(match op {
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        _ => false,
    })
}

/// Execute an arithmetic, string or membership operation
pub(crate) fn execute_binary_op(left: &Value, op: Operator, right: &Value) -> Result<Value> {
    if op.is_arithmetic() {
        return execute_arithmetic(left, op, right);
    }

    match (left, op, right) {
        // String operations
        (Value::String(l), Operator::Contains, Value::String(r)) => Ok(Value::Bool(l.contains(r.as_str()))),
        (Value::String(l), Operator::StartsWith, Value::String(r)) => {
            Ok(Value::Bool(l.starts_with(r.as_str())))
        }
        (Value::String(l), Operator::EndsWith, Value::String(r)) => {
            Ok(Value::Bool(l.ends_with(r.as_str())))
        }

        // Array operations
        (Value::Array(items), Operator::Contains, value) => {
            Ok(Value::Bool(items.iter().any(|v| v == value)))
        }

        // In operator
        (value, Operator::In, Value::Array(items)) => {
            Ok(Value::Bool(items.iter().any(|v| v == value)))
        }
        (value, Operator::NotIn, Value::Array(items)) => {
            Ok(Value::Bool(!items.iter().any(|v| v == value)))
        }
        (Value::String(l), Operator::In, Value::String(r)) => Ok(Value::Bool(r.contains(l.as_str()))),
        (Value::String(l), Operator::NotIn, Value::String(r)) => {
            Ok(Value::Bool(!r.contains(l.as_str())))
        }

        // Missing operands never match
        (Value::Null, Operator::Contains | Operator::StartsWith | Operator::EndsWith, _)
        | (_, Operator::Contains | Operator::StartsWith | Operator::EndsWith, Value::Null)
        | (_, Operator::In, Value::Null) => Ok(Value::Bool(false)),
        (_, Operator::NotIn, Value::Null) => Ok(Value::Bool(true)),

        _ => Err(EvaluationError::TypeError(format!(
            "cannot apply {} to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn execute_arithmetic(left: &Value, op: Operator, right: &Value) -> Result<Value> {
    // Null in arithmetic propagates
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    match (left, op, right) {
        (Value::Number(l), Operator::Add, Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::Number(l), Operator::Sub, Value::Number(r)) => Ok(Value::Number(l - r)),
        (Value::Number(l), Operator::Mul, Value::Number(r)) => Ok(Value::Number(l * r)),
        (Value::Number(l), Operator::Div, Value::Number(r)) => {
            if *r == 0.0 {
                Err(EvaluationError::DivisionByZero)
            } else {
                Ok(Value::Number(l / r))
            }
        }
        (Value::Number(l), Operator::Mod, Value::Number(r)) => {
            if *r == 0.0 {
                Err(EvaluationError::DivisionByZero)
            } else {
                Ok(Value::Number(l % r))
            }
        }

        // String concatenation
        (Value::String(l), Operator::Add, Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),

        _ => Err(EvaluationError::TypeError(format!(
            "cannot apply {} to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}
