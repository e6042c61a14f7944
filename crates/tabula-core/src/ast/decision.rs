//! Decision table AST definitions
//!
//! A [`RuleModel`] is the parsed, in-memory form of one decision table. It is
//! produced once per deployed definition and never mutated afterwards.

use super::expression::Expression;
use crate::error::CoreError;
use crate::types::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleModel {
    /// Decision key the table was declared with
    pub key: String,

    /// Human-readable name
    pub name: Option<String>,

    /// How multiple matching rules combine
    pub hit_policy: HitPolicy,

    /// Optional aggregation over collected outputs (collect policy only)
    pub aggregation: Option<Aggregation>,

    /// Input columns, evaluated once per execution for the audit trail
    pub inputs: Vec<InputClause>,

    /// Declared output columns. Empty means outputs are untyped.
    pub outputs: Vec<OutputClause>,

    /// Rules in table order
    pub rules: Vec<DecisionRule>,
}

impl RuleModel {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            hit_policy: HitPolicy::default(),
            aggregation: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_hit_policy(mut self, hit_policy: HitPolicy) -> Self {
        self.hit_policy = hit_policy;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn with_output(mut self, output: OutputClause) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_rule(mut self, rule: DecisionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Look up a declared output column by name
    pub fn output(&self, name: &str) -> Option<&OutputClause> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// Input column of a decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputClause {
    pub label: Option<String>,
    /// Source text of the input expression
    pub source: String,
    pub expression: Expression,
}

/// Output column of a decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputClause {
    pub name: String,
    pub label: Option<String>,
    pub field_type: FieldType,
}

impl OutputClause {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type,
        }
    }
}

/// A single row of a decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRule {
    /// Rule id, unique within the table
    pub id: String,

    /// All conditions must hold for the rule to fire. Empty means "any input".
    pub conditions: Vec<ConditionEntry>,

    /// Output assignments applied in order when the rule fires
    pub outputs: Vec<OutputEntry>,
}

impl DecisionRule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conditions: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_condition(mut self, source: impl Into<String>, expression: Expression) -> Self {
        self.conditions.push(ConditionEntry {
            source: source.into(),
            expression,
        });
        self
    }

    pub fn with_output(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        expression: Expression,
    ) -> Self {
        self.outputs.push(OutputEntry {
            name: name.into(),
            source: source.into(),
            expression,
        });
        self
    }
}

/// Input condition of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Source text, kept for audit traces
    pub source: String,
    pub expression: Expression,
}

/// Output assignment of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub name: String,
    pub source: String,
    pub expression: Expression,
}

/// Hit policy of a decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Every matching rule fires; outputs merge last-write-wins
    #[default]
    Collect,
    /// Evaluation stops at the first matching rule
    First,
    /// At most one rule may match
    Unique,
    /// Matching rules must all produce the same outputs
    Any,
    /// Every matching rule fires, results kept in table order
    RuleOrder,
}

impl HitPolicy {
    pub fn stops_at_first_match(&self) -> bool {
        matches!(self, HitPolicy::First)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HitPolicy::Collect => "collect",
            HitPolicy::First => "first",
            HitPolicy::Unique => "unique",
            HitPolicy::Any => "any",
            HitPolicy::RuleOrder => "rule_order",
        }
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HitPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "collect" => Ok(HitPolicy::Collect),
            "first" => Ok(HitPolicy::First),
            "unique" => Ok(HitPolicy::Unique),
            "any" => Ok(HitPolicy::Any),
            "rule_order" => Ok(HitPolicy::RuleOrder),
            _ => Err(CoreError::UnknownHitPolicy(s.to_string())),
        }
    }
}

/// Aggregation applied to collected outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Count,
    Min,
    Max,
}

impl FromStr for Aggregation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "count" => Ok(Aggregation::Count),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            _ => Err(CoreError::UnknownAggregation(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hit_policy_is_collect() {
        let model = RuleModel::new("discount");
        assert_eq!(model.hit_policy, HitPolicy::Collect);
        assert!(!model.hit_policy.stops_at_first_match());
    }

    #[test]
    fn test_hit_policy_parsing() {
        assert_eq!("FIRST".parse::<HitPolicy>().unwrap(), HitPolicy::First);
        assert_eq!("rule order".parse::<HitPolicy>().unwrap(), HitPolicy::RuleOrder);
        assert_eq!("rule-order".parse::<HitPolicy>().unwrap(), HitPolicy::RuleOrder);
        assert!(matches!(
            "priority".parse::<HitPolicy>(),
            Err(CoreError::UnknownHitPolicy(_))
        ));
    }

    #[test]
    fn test_aggregation_parsing() {
        assert_eq!("SUM".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert!("avg".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_model_builders() {
        let model = RuleModel::new("risk")
            .with_hit_policy(HitPolicy::First)
            .with_output(OutputClause::new("level", FieldType::String))
            .with_rule(
                DecisionRule::new("r1")
                    .with_condition("true", Expression::literal(true))
                    .with_output("level", "\"low\"", Expression::literal("low")),
            );

        assert_eq!(model.rules.len(), 1);
        assert_eq!(model.output("level").unwrap().field_type, FieldType::String);
        assert!(model.output("score").is_none());
    }
}
