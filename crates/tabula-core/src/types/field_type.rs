//! Declared types of decision table output columns

use crate::error::CoreError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field type of an output clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    List,
    Object,
    /// Any type (no validation)
    #[default]
    Any,
}

impl FieldType {
    /// Check whether a value may be assigned to a column of this type.
    ///
    /// `null` is assignable to every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (FieldType::Any, _) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::List, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::List => "list",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" | "integer" | "double" => Ok(FieldType::Number),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "list" | "array" => Ok(FieldType::List),
            "object" => Ok(FieldType::Object),
            "any" => Ok(FieldType::Any),
            other => Err(CoreError::UnknownFieldType(other.to_string())),
        }
    }
}
