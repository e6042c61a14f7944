//! Audit trail types
//!
//! An [`AuditContainer`] is the immutable record of one decision execution:
//! which definition ran, which rules fired in which order, and what came out.
//! It is assembled by [`AuditTrailBuilder`] once evaluation has finished.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use tabula_core::{DecisionDefinition, HitPolicy, Value};

use crate::error::AuditError;

/// One rule that fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiringRecord {
    /// Position of the rule in the table, starting at 0
    pub rule_index: usize,
    pub rule_id: String,
    /// Output values the rule produced
    pub outputs: HashMap<String, Value>,
}

/// Result of one evaluated condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionTrace {
    /// Condition source text
    pub expression: String,
    /// Value the condition evaluated to
    pub value: Value,
    pub result: bool,
}

/// Evaluation of one rule, fired or not
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTrace {
    pub rule_index: usize,
    pub rule_id: String,
    /// Conditions evaluated before the rule matched or the first one failed
    pub conditions: Vec<ConditionTrace>,
    pub matched: bool,
}

/// Value of one input column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub expression: String,
    pub value: Value,
}

/// Identifying metadata of the executed definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionReference {
    pub id: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: u32,
    pub deployment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_deployment_id: Option<String>,
    pub tenant_id: String,
}

impl From<&DecisionDefinition> for DecisionReference {
    fn from(definition: &DecisionDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            key: definition.key.clone(),
            name: definition.name.clone(),
            version: definition.version,
            deployment_id: definition.deployment_id.clone(),
            parent_deployment_id: definition.parent_deployment_id.clone(),
            tenant_id: definition.tenant_id.clone(),
        }
    }
}

/// Complete record of one decision execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditContainer {
    execution_id: String,
    decision: DecisionReference,
    hit_policy: HitPolicy,
    firing_records: Vec<FiringRecord>,
    outputs: HashMap<String, Value>,
    decision_results: Vec<HashMap<String, Value>>,
    rule_traces: Vec<RuleTrace>,
    inputs: Vec<InputTrace>,
    variables: HashMap<String, Value>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl AuditContainer {
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn decision(&self) -> &DecisionReference {
        &self.decision
    }

    pub fn hit_policy(&self) -> HitPolicy {
        self.hit_policy
    }

    /// Fired rules in table order
    pub fn firing_records(&self) -> &[FiringRecord] {
        &self.firing_records
    }

    /// Final merged outputs
    pub fn outputs(&self) -> &HashMap<String, Value> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Output map of every firing, in firing order
    pub fn decision_results(&self) -> &[HashMap<String, Value>] {
        &self.decision_results
    }

    pub fn rule_traces(&self) -> &[RuleTrace] {
        &self.rule_traces
    }

    pub fn inputs(&self) -> &[InputTrace] {
        &self.inputs
    }

    /// Caller variables the execution ran with
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }

    pub fn fired_rule_ids(&self) -> Vec<&str> {
        self.firing_records
            .iter()
            .map(|r| r.rule_id.as_str())
            .collect()
    }

    pub fn has_matches(&self) -> bool {
        !self.firing_records.is_empty()
    }

    pub fn into_decision_results(self) -> Vec<HashMap<String, Value>> {
        self.decision_results
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Generate a unique execution ID
///
/// Format: exec_YYYYMMDDHHmmss_xxxxxx
pub fn generate_execution_id() -> String {
    let datetime_str = Utc::now().format("%Y%m%d%H%M%S").to_string();
    let random: u32 = rand::thread_rng().gen_range(0..0xFFFFFF);
    format!("exec_{}_{:06x}", datetime_str, random)
}

/// Assembles an [`AuditContainer`]
///
/// The definition, firing records, final outputs and both timestamps are
/// required; everything else defaults to empty.
#[derive(Debug, Default)]
pub struct AuditTrailBuilder {
    execution_id: Option<String>,
    decision: Option<DecisionReference>,
    hit_policy: HitPolicy,
    firing_records: Option<Vec<FiringRecord>>,
    outputs: Option<HashMap<String, Value>>,
    decision_results: Option<Vec<HashMap<String, Value>>>,
    rule_traces: Vec<RuleTrace>,
    inputs: Vec<InputTrace>,
    variables: HashMap<String, Value>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl AuditTrailBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn definition(mut self, definition: &DecisionDefinition) -> Self {
        self.decision = Some(DecisionReference::from(definition));
        self
    }

    pub fn hit_policy(mut self, hit_policy: HitPolicy) -> Self {
        self.hit_policy = hit_policy;
        self
    }

    pub fn firing_records(mut self, records: Vec<FiringRecord>) -> Self {
        self.firing_records = Some(records);
        self
    }

    pub fn outputs(mut self, outputs: HashMap<String, Value>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Per-firing outputs. Derived from the firing records when not set.
    pub fn decision_results(mut self, results: Vec<HashMap<String, Value>>) -> Self {
        self.decision_results = Some(results);
        self
    }

    pub fn rule_traces(mut self, traces: Vec<RuleTrace>) -> Self {
        self.rule_traces = traces;
        self
    }

    pub fn inputs(mut self, inputs: Vec<InputTrace>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn variables(mut self, variables: HashMap<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn build(self) -> Result<AuditContainer, AuditError> {
        let decision = self.decision.ok_or(AuditError::MissingField("definition"))?;
        let firing_records = self
            .firing_records
            .ok_or(AuditError::MissingField("firing_records"))?;
        let outputs = self.outputs.ok_or(AuditError::MissingField("outputs"))?;
        let started_at = self.started_at.ok_or(AuditError::MissingField("started_at"))?;
        let completed_at = self
            .completed_at
            .ok_or(AuditError::MissingField("completed_at"))?;
        // Wall-clock steps can put completion before start
        let completed_at = completed_at.max(started_at);

        let decision_results = self.decision_results.unwrap_or_else(|| {
            firing_records
                .iter()
                .map(|record| record.outputs.clone())
                .collect()
        });

        Ok(AuditContainer {
            execution_id: self.execution_id.unwrap_or_else(generate_execution_id),
            decision,
            hit_policy: self.hit_policy,
            firing_records,
            outputs,
            decision_results,
            rule_traces: self.rule_traces,
            inputs: self.inputs,
            variables: self.variables,
            started_at,
            completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn definition() -> DecisionDefinition {
        DecisionDefinition {
            id: "discount:2:dep".to_string(),
            key: "discount".to_string(),
            name: Some("Discount".to_string()),
            version: 2,
            deployment_id: "dep".to_string(),
            parent_deployment_id: Some("app".to_string()),
            tenant_id: "acme".to_string(),
            resource_name: "discount.yaml".to_string(),
            deployed_at: Utc::now(),
        }
    }

    fn record(index: usize, id: &str, discount: f64) -> FiringRecord {
        FiringRecord {
            rule_index: index,
            rule_id: id.to_string(),
            outputs: HashMap::from([("discount".to_string(), Value::Number(discount))]),
        }
    }

    #[test]
    fn test_build_complete_container() {
        let started = Utc::now();
        let audit = AuditTrailBuilder::new()
            .definition(&definition())
            .hit_policy(HitPolicy::Collect)
            .firing_records(vec![record(0, "r1", 0.1), record(2, "r3", 0.2)])
            .outputs(HashMap::from([("discount".to_string(), Value::Number(0.2))]))
            .started_at(started)
            .completed_at(started + Duration::milliseconds(5))
            .build()
            .unwrap();

        assert!(audit.execution_id().starts_with("exec_"));
        assert_eq!(audit.decision().version, 2);
        assert_eq!(audit.decision().tenant_id, "acme");
        assert_eq!(audit.fired_rule_ids(), vec!["r1", "r3"]);
        assert_eq!(audit.decision_results().len(), 2);
        assert_eq!(audit.output("discount"), Some(&Value::Number(0.2)));
        assert_eq!(audit.duration_ms(), 5);
        assert!(audit.to_json().unwrap().contains("\"rule_id\": \"r3\""));
    }

    #[test]
    fn test_missing_required_fields() {
        let now = Utc::now();
        let err = AuditTrailBuilder::new()
            .firing_records(Vec::new())
            .outputs(HashMap::new())
            .started_at(now)
            .completed_at(now)
            .build()
            .unwrap_err();
        assert_eq!(err, AuditError::MissingField("definition"));

        let err = AuditTrailBuilder::new()
            .definition(&definition())
            .outputs(HashMap::new())
            .started_at(now)
            .completed_at(now)
            .build()
            .unwrap_err();
        assert_eq!(err, AuditError::MissingField("firing_records"));

        let err = AuditTrailBuilder::new()
            .definition(&definition())
            .firing_records(Vec::new())
            .outputs(HashMap::new())
            .started_at(now)
            .build()
            .unwrap_err();
        assert_eq!(err, AuditError::MissingField("completed_at"));
    }

    #[test]
    fn test_clock_step_back_clamps_completion() {
        let now = Utc::now();
        let audit = AuditTrailBuilder::new()
            .definition(&definition())
            .firing_records(Vec::new())
            .outputs(HashMap::new())
            .started_at(now)
            .completed_at(now - Duration::seconds(1))
            .build()
            .unwrap();
        assert_eq!(audit.completed_at(), now);
        assert_eq!(audit.duration_ms(), 0);
    }

    #[test]
    fn test_execution_id_format() {
        let id = generate_execution_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "exec");
        assert_eq!(parts[1].len(), 14);
        assert_eq!(parts[2].len(), 6);
    }
}
