//! Decision requests

use std::collections::HashMap;
use std::fmt;
use tabula_core::Value;
use tabula_runtime::{FunctionRegistry, PropertyHandlerRef};

use crate::error::{Result, SdkError};

/// Immutable description of one decision execution
///
/// Built with [`ExecuteDecisionBuilder`]. The request is only validated when
/// it is executed, so a request without a key can be built but never runs.
#[derive(Clone, Default)]
pub struct DecisionRequest {
    decision_key: Option<String>,
    parent_deployment_id: Option<String>,
    decision_id: Option<String>,
    tenant_id: Option<String>,
    variables: HashMap<String, Value>,
    functions: FunctionRegistry,
    property_handlers: Vec<PropertyHandlerRef>,
}

impl DecisionRequest {
    /// Start a request for `decision_key`
    pub fn builder(decision_key: impl Into<String>) -> ExecuteDecisionBuilder {
        ExecuteDecisionBuilder::new().decision_key(decision_key)
    }

    pub fn decision_key(&self) -> Option<&str> {
        self.decision_key.as_deref()
    }

    pub fn parent_deployment_id(&self) -> Option<&str> {
        self.parent_deployment_id.as_deref()
    }

    /// Explicit definition id; overrides every other selector
    pub fn decision_id(&self) -> Option<&str> {
        self.decision_id.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn property_handlers(&self) -> &[PropertyHandlerRef] {
        &self.property_handlers
    }

    /// Check the request and return its decision key
    ///
    /// Runs before any repository call.
    pub fn validate(&self) -> Result<&str> {
        let key = match self.decision_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(SdkError::InvalidArgument(
                    "decision key is required".to_string(),
                ))
            }
        };
        if matches!(self.decision_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(SdkError::InvalidArgument(
                "decision id must not be empty".to_string(),
            ));
        }
        if matches!(self.parent_deployment_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(SdkError::InvalidArgument(
                "parent deployment id must not be empty".to_string(),
            ));
        }
        Ok(key)
    }
}

impl fmt::Debug for DecisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<&str> = self.property_handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("DecisionRequest")
            .field("decision_key", &self.decision_key)
            .field("parent_deployment_id", &self.parent_deployment_id)
            .field("decision_id", &self.decision_id)
            .field("tenant_id", &self.tenant_id)
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("property_handlers", &handlers)
            .finish()
    }
}

/// Accumulates the parts of a [`DecisionRequest`]
///
/// # Example
///
/// ```
/// use tabula_sdk::ExecuteDecisionBuilder;
///
/// let request = ExecuteDecisionBuilder::new()
///     .decision_key("discount")
///     .with_tenant_id("acme")
///     .with_variable("total", 250.0)
///     .build();
///
/// assert_eq!(request.decision_key(), Some("discount"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecuteDecisionBuilder {
    request: DecisionRequest,
}

impl ExecuteDecisionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision_key(mut self, key: impl Into<String>) -> Self {
        self.request.decision_key = Some(key.into());
        self
    }

    /// Restrict resolution to definitions deployed with a parent deployment
    pub fn with_parent_deployment_id(mut self, parent_deployment_id: impl Into<String>) -> Self {
        self.request.parent_deployment_id = Some(parent_deployment_id.into());
        self
    }

    /// Pin an exact definition
    pub fn with_decision_id(mut self, decision_id: impl Into<String>) -> Self {
        self.request.decision_id = Some(decision_id.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.request.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, Value>) -> Self {
        self.request.variables.extend(variables);
        self
    }

    /// Register a function for this request only; shadows engine and built-in functions
    pub fn with_custom_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.request.functions.register(name, function);
        self
    }

    /// Append a handler that runs after the engine's handlers
    pub fn with_property_handler(mut self, handler: PropertyHandlerRef) -> Self {
        self.request.property_handlers.push(handler);
        self
    }

    pub fn build(self) -> DecisionRequest {
        self.request
    }
}
