//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug)]
pub enum ParseError {
    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Invalid field value
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Invalid expression syntax
    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    /// Rule assigns an output column the table does not declare
    #[error("Rule '{rule}' assigns undeclared output '{output}'")]
    UndeclaredOutput { rule: String, output: String },

    /// Two rules share an id
    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ParseError::MissingField {
            field: "decision.key".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required field: decision.key");

        let err = ParseError::UndeclaredOutput {
            rule: "r1".to_string(),
            output: "bonus".to_string(),
        };
        assert!(err.to_string().contains("undeclared output 'bonus'"));
    }
}
