//! Runtime error types

use thiserror::Error;

/// Error raised while evaluating a decision table
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Function referenced by an expression is neither built in nor registered
    #[error("Unknown function: '{name}'")]
    UnknownFunction { name: String },

    /// Built-in or custom function reported a failure
    #[error("Function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },

    /// Operand types do not support the operation
    #[error("Type error: {0}")]
    TypeError(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Condition produced something other than a boolean
    #[error("Condition '{condition}' evaluated to {actual}, expected boolean")]
    ConditionNotBoolean { condition: String, actual: String },

    /// Output value incompatible with the declared output column type
    #[error("Output '{output}' expects {expected}, got {actual}")]
    OutputTypeMismatch {
        output: String,
        expected: String,
        actual: String,
    },

    /// Property handler failed to produce its properties
    #[error("Property handler '{handler}' failed: {message}")]
    PropertyHandler { handler: String, message: String },

    /// Matching rules violate the table's hit policy
    #[error("Hit policy '{policy}' violated: {message}")]
    HitPolicyViolation { policy: String, message: String },

    /// Collected outputs cannot be aggregated
    #[error("Cannot aggregate output '{output}': {message}")]
    Aggregation { output: String, message: String },

    /// Failure inside a specific rule, with the offending expression
    #[error("Rule '{rule_id}' failed evaluating '{expression}': {source}")]
    Rule {
        rule_id: String,
        expression: String,
        #[source]
        source: Box<EvaluationError>,
    },

    /// Failure evaluating an input column
    #[error("Input '{expression}' failed: {source}")]
    Input {
        expression: String,
        #[source]
        source: Box<EvaluationError>,
    },

    /// Audit container could not be assembled
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl EvaluationError {
    pub(crate) fn in_rule(self, rule_id: &str, expression: &str) -> Self {
        EvaluationError::Rule {
            rule_id: rule_id.to_string(),
            expression: expression.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping rule and input context
    pub fn root_cause(&self) -> &EvaluationError {
        match self {
            EvaluationError::Rule { source, .. } | EvaluationError::Input { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// Error raised while assembling an audit container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// A required part was not supplied to the builder
    #[error("Audit trail is missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_context_keeps_function_name() {
        let err = EvaluationError::UnknownFunction {
            name: "credit_score".to_string(),
        }
        .in_rule("r1", "credit_score(customer) > 600");

        let message = err.to_string();
        assert!(message.contains("r1"));
        assert!(message.contains("credit_score"));
        assert!(matches!(
            err.root_cause(),
            EvaluationError::UnknownFunction { name } if name == "credit_score"
        ));
    }

    #[test]
    fn test_audit_error_converts() {
        let err: EvaluationError = AuditError::MissingField("definition").into();
        assert!(err.to_string().contains("definition"));
    }
}
