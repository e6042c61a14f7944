//! Expression AST nodes

use super::operator::Operator;
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),

    /// Variable access (e.g., customer.age, sys.hour)
    FieldAccess(Vec<String>),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Function call, resolved against built-in and caller-registered functions
    FunctionCall { name: String, args: Vec<Expression> },

    /// List literal (e.g., ["gold", "silver"])
    List(Vec<Expression>),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT (!)
    Not,
    /// Arithmetic negation (-)
    Negate,
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    /// Create a field access expression
    pub fn field_access(path: Vec<String>) -> Self {
        Expression::FieldAccess(path)
    }

    /// Create a field access expression from a dotted path
    pub fn variable(path: &str) -> Self {
        Expression::FieldAccess(path.split('.').map(|s| s.to_string()).collect())
    }

    /// Create a binary expression
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression
    pub fn function_call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_splits_path() {
        assert_eq!(
            Expression::variable("customer.age"),
            Expression::FieldAccess(vec!["customer".to_string(), "age".to_string()])
        );
    }

    #[test]
    fn test_binary_expression() {
        let expr = Expression::binary(
            Expression::variable("amount"),
            Operator::Gt,
            Expression::literal(100.0),
        );

        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::Gt);
                assert_eq!(*right, Expression::Literal(Value::Number(100.0)));
            }
            _ => panic!("Expected Binary expression"),
        }
    }
}
