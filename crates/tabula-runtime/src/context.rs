//! Evaluation context
//!
//! Variables visible to a single decision evaluation: the caller's variables
//! layered over properties derived by the property handlers.

use std::collections::HashMap;
use tabula_core::Value;

use crate::error::Result;
use crate::function::FunctionRegistry;
use crate::property::PropertyHandlerRef;

/// Variables and functions available while evaluating one decision
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    variables: HashMap<String, Value>,
    functions: &'a FunctionRegistry,
}

impl<'a> ExecutionContext<'a> {
    /// Context over the caller's variables only
    pub fn new(variables: HashMap<String, Value>, functions: &'a FunctionRegistry) -> Self {
        Self {
            variables,
            functions,
        }
    }

    /// Run `handlers` in order and layer `variables` on top of their output
    pub fn with_handlers(
        variables: &HashMap<String, Value>,
        handlers: &[PropertyHandlerRef],
        functions: &'a FunctionRegistry,
    ) -> Result<Self> {
        let mut merged = HashMap::new();

        for handler in handlers {
            let properties = handler.properties(variables).map_err(|e| {
                tracing::warn!("Property handler '{}' failed: {}", handler.name(), e);
                e
            })?;
            tracing::debug!(
                "Property handler '{}' contributed {} properties",
                handler.name(),
                properties.len()
            );
            merged.extend(properties);
        }

        for (name, value) in variables {
            if merged.contains_key(name) {
                tracing::debug!("Caller variable '{}' overrides derived property", name);
            }
            merged.insert(name.clone(), value.clone());
        }

        Ok(Self::new(merged, functions))
    }

    /// Resolve a dotted path. Missing segments yield `Value::Null`.
    pub fn lookup(&self, path: &[String]) -> Value {
        let Some((head, rest)) = path.split_first() else {
            return Value::Null;
        };

        match self.variables.get(head).and_then(|value| value.lookup(rest)) {
            Some(value) => value.clone(),
            None => {
                tracing::debug!("Field not found: {}, returning Null", path.join("."));
                Value::Null
            }
        }
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn functions(&self) -> &FunctionRegistry {
        self.functions
    }
}
