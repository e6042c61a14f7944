//! YAML Parser
//!
//! Utilities for reading fields out of untyped YAML documents.

use crate::error::{ParseError, Result};
use serde_yaml::Value as YamlValue;

/// YAML parser utilities
pub struct YamlParser;

impl YamlParser {
    /// Parse YAML string into a YAML value
    pub fn parse(yaml_str: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    pub fn get_string(obj: &YamlValue, field: &str) -> Result<String> {
        Self::get_optional_string(obj, field).ok_or_else(|| ParseError::MissingField {
            field: field.to_string(),
        })
    }

    /// Read a scalar as a string; numbers and booleans are stringified
    pub fn get_optional_string(obj: &YamlValue, field: &str) -> Option<String> {
        obj.get(field).and_then(Self::scalar_to_string)
    }

    pub fn get_optional_array<'a>(obj: &'a YamlValue, field: &str) -> Option<&'a Vec<YamlValue>> {
        obj.get(field).and_then(|v| v.as_sequence())
    }

    pub fn get_optional_object<'a>(
        obj: &'a YamlValue,
        field: &str,
    ) -> Option<&'a serde_yaml::Mapping> {
        obj.get(field).and_then(|v| v.as_mapping())
    }

    /// Convert a scalar YAML value to its string form
    pub fn scalar_to_string(value: &YamlValue) -> Option<String> {
        match value {
            YamlValue::String(s) => Some(s.clone()),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
