//! Expression evaluator

use tabula_core::{Expression, Operator, UnaryOperator, Value};

use crate::context::ExecutionContext;
use crate::error::{EvaluationError, Result};
use crate::operators::{execute_binary_op, execute_compare};

/// Evaluate an expression against a context
pub fn evaluate(expression: &Expression, ctx: &ExecutionContext<'_>) -> Result<Value> {
    match expression {
        Expression::Literal(value) => Ok(value.clone()),

        Expression::FieldAccess(path) => Ok(ctx.lookup(path)),

        Expression::Binary { left, op, right } => match op {
            Operator::And | Operator::Or => evaluate_logical(left, *op, right, ctx),
            op if op.is_comparison() => {
                let l = evaluate(left, ctx)?;
                let r = evaluate(right, ctx)?;
                execute_compare(&l, *op, &r).map(Value::Bool)
            }
            op => {
                let l = evaluate(left, ctx)?;
                let r = evaluate(right, ctx)?;
                execute_binary_op(&l, *op, &r)
            }
        },

        Expression::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match (op, value) {
                (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnaryOperator::Not, Value::Null) => Ok(Value::Bool(true)),
                (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                (UnaryOperator::Negate, Value::Null) => Ok(Value::Null),
                (op, value) => Err(EvaluationError::TypeError(format!(
                    "cannot apply {:?} to {}",
                    op,
                    value.type_name()
                ))),
            }
        }

        Expression::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>>>()?;
            ctx.functions().call(name, &args)
        }

        Expression::List(items) => items
            .iter()
            .map(|item| evaluate(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
    }
}

/// Short-circuit `&&` / `||`. Null counts as false.
fn evaluate_logical(
    left: &Expression,
    op: Operator,
    right: &Expression,
    ctx: &ExecutionContext<'_>,
) -> Result<Value> {
    let l = truthiness(&evaluate(left, ctx)?, op)?;
    match (op, l) {
        (Operator::And, false) => return Ok(Value::Bool(false)),
        (Operator::Or, true) => return Ok(Value::Bool(true)),
        _ => {}
    }
    let r = truthiness(&evaluate(right, ctx)?, op)?;
    Ok(Value::Bool(r))
}

fn truthiness(value: &Value, op: Operator) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(EvaluationError::TypeError(format!(
            "operand of {} must be boolean, got {}",
            op,
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionRegistry;
    use std::collections::HashMap;
    use tabula_parser::ExpressionParser;

    fn eval_with(source: &str, functions: &FunctionRegistry) -> Result<Value> {
        let customer = HashMap::from([
            ("age".to_string(), Value::Number(34.0)),
            ("tier".to_string(), Value::from("gold")),
            ("tags".to_string(), Value::Array(vec![Value::from("vip")])),
        ]);
        let variables = HashMap::from([
            ("customer".to_string(), Value::Object(customer)),
            ("total".to_string(), Value::Number(250.0)),
        ]);
        let ctx = ExecutionContext::new(variables, functions);
        let expression = ExpressionParser::parse(source).unwrap();
        evaluate(&expression, &ctx)
    }

    fn eval(source: &str) -> Value {
        eval_with(source, &FunctionRegistry::new()).unwrap()
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("customer.age >= 18 && total > 100"), Value::Bool(true));
        assert_eq!(eval("customer.age < 18 || customer.tier == \"gold\""), Value::Bool(true));
        assert_eq!(eval("!(total > 1000)"), Value::Bool(true));
        assert_eq!(eval("customer.tier in [\"gold\", \"silver\"]"), Value::Bool(true));
        assert_eq!(eval("customer.tags contains \"vip\""), Value::Bool(true));
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("total * 0.1 + 5"), Value::Number(30.0));
        assert_eq!(eval("(total + 50) / 3"), Value::Number(100.0));
        assert_eq!(eval("-customer.age"), Value::Number(-34.0));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(eval("customer.income"), Value::Null);
        assert_eq!(eval("customer.income > 1000"), Value::Bool(false));
        assert_eq!(eval("customer.income == null"), Value::Bool(true));
        assert_eq!(eval("customer.income > 0 && true"), Value::Bool(false));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        // The right side would fail on an unknown function
        assert_eq!(eval("false && nope()"), Value::Bool(false));
        assert_eq!(eval("true || nope()"), Value::Bool(true));
    }

    #[test]
    fn test_function_calls() {
        let mut functions = FunctionRegistry::new();
        functions.register("double", |args: &[Value]| match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Err("expected one number".to_string()),
        });

        assert_eq!(eval_with("double(total)", &functions).unwrap(), Value::Number(500.0));
        assert_eq!(eval("upper(customer.tier)"), Value::from("GOLD"));
        assert_eq!(eval("len(customer.tags)"), Value::Number(1.0));

        let err = eval_with("credit_check(customer)", &functions).unwrap_err();
        assert!(matches!(err, EvaluationError::UnknownFunction { ref name } if name == "credit_check"));
    }

    #[test]
    fn test_type_errors() {
        assert!(eval_with("customer.tier > 3", &FunctionRegistry::new()).is_err());
        assert!(eval_with("total && true", &FunctionRegistry::new()).is_err());
    }
}
