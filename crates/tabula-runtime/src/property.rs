//! Property handlers
//!
//! A property handler derives extra variables from the caller's input so
//! rules can reference them without the caller precomputing them. Handlers
//! run in order before evaluation; later handlers overwrite properties of
//! earlier ones, and caller variables always take precedence.

use chrono::{Datelike, Timelike, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tabula_core::Value;

use crate::error::Result;

/// Source of derived variables
pub trait PropertyHandler: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Properties to add to the evaluation context
    fn properties(&self, variables: &HashMap<String, Value>) -> Result<HashMap<String, Value>>;
}

/// Shared handle to a property handler
pub type PropertyHandlerRef = Arc<dyn PropertyHandler>;

/// Exposes date and time of the execution under `sys`
///
/// `sys.timestamp`, `sys.date`, `sys.year`, `sys.month`, `sys.day`,
/// `sys.hour`, `sys.minute`, `sys.day_of_week`, `sys.is_weekend`, and more.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPropertyHandler;

impl SystemPropertyHandler {
    pub const NAMESPACE: &'static str = "sys";
}

impl PropertyHandler for SystemPropertyHandler {
    fn name(&self) -> &str {
        "system"
    }

    fn properties(&self, _variables: &HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        let mut properties = HashMap::new();
        properties.insert(
            Self::NAMESPACE.to_string(),
            Value::Object(build_system_vars()),
        );
        Ok(properties)
    }
}

fn build_system_vars() -> HashMap<String, Value> {
    let mut sys = HashMap::new();
    let now = Utc::now();

    sys.insert(
        "request_id".to_string(),
        Value::String(uuid::Uuid::new_v4().to_string()),
    );

    sys.insert("timestamp".to_string(), Value::String(now.to_rfc3339()));
    sys.insert(
        "timestamp_ms".to_string(),
        Value::Number(now.timestamp_millis() as f64),
    );

    sys.insert(
        "date".to_string(),
        Value::String(now.format("%Y-%m-%d").to_string()),
    );
    sys.insert("year".to_string(), Value::Number(now.year() as f64));
    sys.insert("month".to_string(), Value::Number(now.month() as f64));
    sys.insert("day".to_string(), Value::Number(now.day() as f64));
    sys.insert("quarter".to_string(), Value::Number((((now.month() - 1) / 3) + 1) as f64));
    sys.insert("day_of_year".to_string(), Value::Number(now.ordinal() as f64));

    sys.insert(
        "time".to_string(),
        Value::String(now.format("%H:%M:%S").to_string()),
    );
    sys.insert("hour".to_string(), Value::Number(now.hour() as f64));
    sys.insert("minute".to_string(), Value::Number(now.minute() as f64));

    // 1 = Monday, 7 = Sunday
    let weekday = now.weekday();
    let day_of_week = match weekday {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    };
    sys.insert(
        "day_of_week".to_string(),
        Value::String(day_of_week.to_string()),
    );
    sys.insert(
        "day_of_week_num".to_string(),
        Value::Number(weekday.number_from_monday() as f64),
    );
    let is_weekend = matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun);
    sys.insert("is_weekend".to_string(), Value::Bool(is_weekend));
    sys.insert("is_weekday".to_string(), Value::Bool(!is_weekend));

    sys
}

/// Property handler backed by a closure
pub struct FnPropertyHandler<F> {
    name: String,
    function: F,
}

impl<F> FnPropertyHandler<F>
where
    F: Fn(&HashMap<String, Value>) -> Result<HashMap<String, Value>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl<F> PropertyHandler for FnPropertyHandler<F>
where
    F: Fn(&HashMap<String, Value>) -> Result<HashMap<String, Value>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self, variables: &HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        (self.function)(variables)
    }
}

impl<F> fmt::Debug for FnPropertyHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPropertyHandler")
            .field("name", &self.name)
            .finish()
    }
}

/// Fixed set of properties, independent of the input
#[derive(Debug, Clone)]
pub struct StaticPropertyHandler {
    name: String,
    properties: HashMap<String, Value>,
}

impl StaticPropertyHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl PropertyHandler for StaticPropertyHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self, _variables: &HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        Ok(self.properties.clone())
    }
}
