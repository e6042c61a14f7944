//! Rule engine executor
//!
//! Evaluates a [`RuleModel`] against caller variables. Rules are visited once
//! each, in table order; a rule fires when every condition holds. The table's
//! hit policy decides whether evaluation stops at the first firing and which
//! combinations of firings are legal.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_core::{Aggregation, DecisionDefinition, HitPolicy, RuleModel, Value};

use crate::audit::{AuditContainer, AuditTrailBuilder, ConditionTrace, FiringRecord, InputTrace, RuleTrace};
use crate::context::ExecutionContext;
use crate::error::{EvaluationError, Result};
use crate::evaluator::evaluate;
use crate::function::FunctionRegistry;
use crate::property::PropertyHandlerRef;

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Record a trace for every evaluated rule, not only fired ones
    pub trace_rules: bool,
    /// Copy the caller's variables into the audit container
    pub snapshot_variables: bool,
    /// Treat a condition that evaluates to null as not matching instead of failing
    pub null_condition_is_false: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            trace_rules: true,
            snapshot_variables: true,
            null_condition_is_false: true,
        }
    }
}

/// Everything evaluation produced, before audit assembly
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub firing_records: Vec<FiringRecord>,
    pub outputs: HashMap<String, Value>,
    pub rule_traces: Vec<RuleTrace>,
    pub inputs: Vec<InputTrace>,
}

impl EvaluationOutcome {
    pub fn decision_results(&self) -> Vec<HashMap<String, Value>> {
        self.firing_records
            .iter()
            .map(|record| record.outputs.clone())
            .collect()
    }
}

/// Stateless rule engine
#[derive(Debug, Clone, Default)]
pub struct RuleEngineExecutor {
    config: EvaluationConfig,
}

impl RuleEngineExecutor {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate and assemble the audit container in one step
    pub fn execute(
        &self,
        definition: &DecisionDefinition,
        model: &RuleModel,
        variables: &HashMap<String, Value>,
        functions: &FunctionRegistry,
        handlers: &[PropertyHandlerRef],
    ) -> Result<AuditContainer> {
        let started_at = Utc::now();
        let outcome = self.evaluate(model, variables, functions, handlers)?;
        let audit = self
            .audit_builder(definition, model, variables, outcome)
            .started_at(started_at)
            .completed_at(Utc::now())
            .build()?;
        Ok(audit)
    }

    /// Builder pre-populated with the outcome; timestamps are left to the caller
    pub fn audit_builder(
        &self,
        definition: &DecisionDefinition,
        model: &RuleModel,
        variables: &HashMap<String, Value>,
        outcome: EvaluationOutcome,
    ) -> AuditTrailBuilder {
        let decision_results = outcome.decision_results();
        let builder = AuditTrailBuilder::new()
            .definition(definition)
            .hit_policy(model.hit_policy)
            .firing_records(outcome.firing_records)
            .outputs(outcome.outputs)
            .decision_results(decision_results)
            .rule_traces(outcome.rule_traces)
            .inputs(outcome.inputs);

        if self.config.snapshot_variables {
            builder.variables(variables.clone())
        } else {
            builder
        }
    }

    /// Evaluate the rule model
    ///
    /// Any failure aborts the evaluation; no partial outcome is returned.
    pub fn evaluate(
        &self,
        model: &RuleModel,
        variables: &HashMap<String, Value>,
        functions: &FunctionRegistry,
        handlers: &[PropertyHandlerRef],
    ) -> Result<EvaluationOutcome> {
        let ctx = ExecutionContext::with_handlers(variables, handlers, functions)?;

        let inputs = model
            .inputs
            .iter()
            .map(|input| {
                let value = evaluate(&input.expression, &ctx).map_err(|e| EvaluationError::Input {
                    expression: input.source.clone(),
                    source: Box::new(e),
                })?;
                Ok(InputTrace {
                    label: input.label.clone(),
                    expression: input.source.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut firing_records = Vec::new();
        let mut rule_traces = Vec::new();

        for (rule_index, rule) in model.rules.iter().enumerate() {
            let mut conditions = Vec::with_capacity(rule.conditions.len());
            let mut matched = true;

            for condition in &rule.conditions {
                let value = evaluate(&condition.expression, &ctx)
                    .map_err(|e| e.in_rule(&rule.id, &condition.source))?;
                let result = match &value {
                    Value::Bool(b) => *b,
                    Value::Null if self.config.null_condition_is_false => false,
                    other => {
                        return Err(EvaluationError::ConditionNotBoolean {
                            condition: condition.source.clone(),
                            actual: other.type_name().to_string(),
                        }
                        .in_rule(&rule.id, &condition.source))
                    }
                };
                conditions.push(ConditionTrace {
                    expression: condition.source.clone(),
                    value,
                    result,
                });
                if !result {
                    matched = false;
                    break;
                }
            }

            if self.config.trace_rules {
                rule_traces.push(RuleTrace {
                    rule_index,
                    rule_id: rule.id.clone(),
                    conditions,
                    matched,
                });
            }

            if !matched {
                tracing::debug!("Rule '{}' did not match", rule.id);
                continue;
            }

            let mut outputs = HashMap::with_capacity(rule.outputs.len());
            for entry in &rule.outputs {
                let value = evaluate(&entry.expression, &ctx)
                    .map_err(|e| e.in_rule(&rule.id, &entry.source))?;
                if let Some(clause) = model.output(&entry.name) {
                    if !clause.field_type.accepts(&value) {
                        return Err(EvaluationError::OutputTypeMismatch {
                            output: entry.name.clone(),
                            expected: clause.field_type.to_string(),
                            actual: value.type_name().to_string(),
                        }
                        .in_rule(&rule.id, &entry.source));
                    }
                }
                outputs.insert(entry.name.clone(), value);
            }

            tracing::debug!("Rule '{}' fired", rule.id);
            firing_records.push(FiringRecord {
                rule_index,
                rule_id: rule.id.clone(),
                outputs,
            });

            if model.hit_policy.stops_at_first_match() {
                break;
            }
        }

        enforce_hit_policy(model.hit_policy, &firing_records)?;

        let outputs = match model.aggregation {
            Some(aggregation) => aggregate(aggregation, &firing_records)?,
            None => merge_outputs(&firing_records),
        };

        tracing::debug!(
            "Decision '{}' evaluated: {} of {} rules fired",
            model.key,
            firing_records.len(),
            model.rules.len()
        );

        Ok(EvaluationOutcome {
            firing_records,
            outputs,
            rule_traces,
            inputs,
        })
    }
}

/// Check the firings against hit policies that restrict them
fn enforce_hit_policy(policy: HitPolicy, records: &[FiringRecord]) -> Result<()> {
    match policy {
        HitPolicy::Unique if records.len() > 1 => Err(EvaluationError::HitPolicyViolation {
            policy: policy.to_string(),
            message: format!(
                "{} rules matched: {}",
                records.len(),
                records
                    .iter()
                    .map(|r| r.rule_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
        HitPolicy::Any => {
            if let Some((first, rest)) = records.split_first() {
                if let Some(other) = rest.iter().find(|r| r.outputs != first.outputs) {
                    return Err(EvaluationError::HitPolicyViolation {
                        policy: policy.to_string(),
                        message: format!(
                            "rules '{}' and '{}' produced different outputs",
                            first.rule_id, other.rule_id
                        ),
                    });
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Last write wins, in firing order
fn merge_outputs(records: &[FiringRecord]) -> HashMap<String, Value> {
    let mut merged = HashMap::new();
    for record in records {
        for (name, value) in &record.outputs {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}

fn aggregate(aggregation: Aggregation, records: &[FiringRecord]) -> Result<HashMap<String, Value>> {
    let mut collected: HashMap<&str, Vec<&Value>> = HashMap::new();
    for record in records {
        for (name, value) in &record.outputs {
            collected.entry(name.as_str()).or_default().push(value);
        }
    }

    let mut result = HashMap::with_capacity(collected.len());
    for (name, values) in collected {
        let value = match aggregation {
            Aggregation::Count => Value::Number(values.len() as f64),
            Aggregation::Sum | Aggregation::Min | Aggregation::Max => {
                let numbers = values
                    .iter()
                    .map(|value| {
                        value.as_f64().ok_or_else(|| EvaluationError::Aggregation {
                            output: name.to_string(),
                            message: format!("expected number, got {}", value.type_name()),
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                let folded = match aggregation {
                    Aggregation::Sum => numbers.iter().sum(),
                    Aggregation::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
                    _ => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                };
                Value::Number(folded)
            }
        };
        result.insert(name.to_string(), value);
    }

    Ok(result)
}
