//! Expression functions
//!
//! Built-in functions are always available. Callers register additional
//! functions in a [`FunctionRegistry`]; a registered function shadows a
//! built-in of the same name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tabula_core::Value;

use crate::error::{EvaluationError, Result};

/// Caller-supplied expression function
///
/// Receives already evaluated arguments. An `Err` message is reported as
/// [`EvaluationError::FunctionFailed`].
pub type CustomFunction =
    Arc<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>;

/// Names of the functions every expression can call
pub const BUILTIN_FUNCTIONS: &[&str] = &["len", "lower", "upper", "abs", "min", "max", "round", "is_null"];

/// Registry of caller-supplied functions
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, CustomFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn insert(&mut self, name: impl Into<String>, function: CustomFunction) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<&CustomFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Copy every function of `other` into this registry; `other` wins on conflicts
    pub fn extend_from(&mut self, other: &FunctionRegistry) {
        for (name, function) in &other.functions {
            self.functions.insert(name.clone(), Arc::clone(function));
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Call `name`, preferring a registered function over a built-in
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if let Some(function) = self.functions.get(name) {
            return function(args).map_err(|message| EvaluationError::FunctionFailed {
                name: name.to_string(),
                message,
            });
        }

        call_builtin(name, args).unwrap_or_else(|| {
            Err(EvaluationError::UnknownFunction {
                name: name.to_string(),
            })
        })
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Dispatch a built-in function. `None` when no built-in has that name.
fn call_builtin(name: &str, args: &[Value]) -> Option<Result<Value>> {
    let result = match name {
        "len" => unary(name, args).and_then(|value| match value {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            Value::Object(map) => Ok(Value::Number(map.len() as f64)),
            Value::Null => Ok(Value::Number(0.0)),
            other => Err(failed(name, format!("cannot take length of {}", other.type_name()))),
        }),
        "lower" => unary(name, args).and_then(|value| match value {
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            Value::Null => Ok(Value::Null),
            other => Err(failed(name, format!("expected string, got {}", other.type_name()))),
        }),
        "upper" => unary(name, args).and_then(|value| match value {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            Value::Null => Ok(Value::Null),
            other => Err(failed(name, format!("expected string, got {}", other.type_name()))),
        }),
        "abs" => unary(name, args).and_then(|value| match value {
            Value::Number(n) => Ok(Value::Number(n.abs())),
            Value::Null => Ok(Value::Null),
            other => Err(failed(name, format!("expected number, got {}", other.type_name()))),
        }),
        "min" => extremum(name, args, f64::min),
        "max" => extremum(name, args, f64::max),
        "round" => round(args),
        "is_null" => unary(name, args).map(|value| Value::Bool(value.is_null())),
        _ => return None,
    };
    Some(result)
}

fn failed(name: &str, message: String) -> EvaluationError {
    EvaluationError::FunctionFailed {
        name: name.to_string(),
        message,
    }
}

fn unary<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(failed(name, format!("expected 1 argument, got {}", args.len()))),
    }
}

/// `min`/`max` over the arguments, or over a single list argument.
/// Null entries are ignored; no numbers at all yields null.
fn extremum(name: &str, args: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value> {
    let values = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };

    let mut best: Option<f64> = None;
    for value in values {
        match value {
            Value::Number(n) => best = Some(best.map_or(*n, |b| pick(b, *n))),
            Value::Null => {}
            other => {
                return Err(failed(name, format!("expected numbers, got {}", other.type_name())))
            }
        }
    }

    Ok(best.map(Value::Number).unwrap_or(Value::Null))
}

/// `round(x)` or `round(x, digits)`
fn round(args: &[Value]) -> Result<Value> {
    let (value, digits) = match args {
        [value] => (value, 0.0),
        [value, Value::Number(digits)] => (value, *digits),
        _ => return Err(failed("round", "expected (number) or (number, digits)".to_string())),
    };

    match value {
        Value::Number(n) => {
            let factor = 10f64.powi(digits as i32);
            Ok(Value::Number((n * factor).round() / factor))
        }
        Value::Null => Ok(Value::Null),
        other => Err(failed("round", format!("expected number, got {}", other.type_name()))),
    }
}
