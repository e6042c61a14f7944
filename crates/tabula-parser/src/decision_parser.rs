//! Decision table parser
//!
//! Parses YAML decision table documents into [`RuleModel`] AST nodes.
//!
//! ```yaml
//! decision:
//!   key: discount
//!   name: Discount
//!   hit_policy: first
//!   inputs:
//!     - label: Customer age
//!       expression: customer.age
//!   outputs:
//!     - name: discount
//!       type: number
//!   rules:
//!     - id: adults
//!       when:
//!         - customer.age >= 18
//!       then:
//!         discount: 0.1
//! ```
//!
//! `when` entries and `then` values are expressions. A bare word in `then`
//! is a variable reference, so string constants must be quoted inside the
//! YAML scalar (`tier: '"gold"'`).

use crate::error::{ParseError, Result};
use crate::expression_parser::ExpressionParser;
use crate::yaml_parser::YamlParser;
use serde_yaml::Value as YamlValue;
use std::collections::HashSet;
use tabula_core::ast::{
    Aggregation, ConditionEntry, DecisionRule, HitPolicy, InputClause, OutputClause, OutputEntry,
    RuleModel,
};
use tabula_core::FieldType;

/// Decision table parser
pub struct DecisionTableParser;

impl DecisionTableParser {
    /// Parse a decision table from a YAML string
    pub fn parse(yaml_str: &str) -> Result<RuleModel> {
        let yaml = YamlParser::parse(yaml_str)?;
        Self::parse_from_yaml(&yaml)
    }

    /// Parse a decision table from a YAML value
    pub fn parse_from_yaml(yaml: &YamlValue) -> Result<RuleModel> {
        let decision = yaml.get("decision").ok_or_else(|| ParseError::MissingField {
            field: "decision".to_string(),
        })?;

        let key = YamlParser::get_string(decision, "key")?;
        if key.trim().is_empty() {
            return Err(ParseError::InvalidValue {
                field: "key".to_string(),
                message: "decision key must not be empty".to_string(),
            });
        }

        let hit_policy = match YamlParser::get_optional_string(decision, "hit_policy") {
            Some(raw) => raw.parse::<HitPolicy>().map_err(|e| ParseError::InvalidValue {
                field: "hit_policy".to_string(),
                message: e.to_string(),
            })?,
            None => HitPolicy::default(),
        };

        let aggregation = match YamlParser::get_optional_string(decision, "aggregation") {
            Some(raw) => Some(raw.parse::<Aggregation>().map_err(|e| {
                ParseError::InvalidValue {
                    field: "aggregation".to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };
        if aggregation.is_some() && hit_policy != HitPolicy::Collect {
            return Err(ParseError::InvalidValue {
                field: "aggregation".to_string(),
                message: format!("aggregation requires hit policy 'collect', found '{}'", hit_policy),
            });
        }

        let inputs = match YamlParser::get_optional_array(decision, "inputs") {
            Some(items) => items
                .iter()
                .map(Self::parse_input)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let outputs = match YamlParser::get_optional_array(decision, "outputs") {
            Some(items) => items
                .iter()
                .map(Self::parse_output)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let rule_items = YamlParser::get_optional_array(decision, "rules").ok_or_else(|| {
            ParseError::MissingField {
                field: "decision.rules".to_string(),
            }
        })?;

        let mut rules = Vec::with_capacity(rule_items.len());
        let mut seen_ids = HashSet::new();
        for (index, item) in rule_items.iter().enumerate() {
            let rule = Self::parse_rule(item, index)?;
            if !seen_ids.insert(rule.id.clone()) {
                return Err(ParseError::DuplicateRule(rule.id));
            }
            if !outputs.is_empty() {
                for entry in &rule.outputs {
                    if !outputs.iter().any(|o| o.name == entry.name) {
                        return Err(ParseError::UndeclaredOutput {
                            rule: rule.id.clone(),
                            output: entry.name.clone(),
                        });
                    }
                }
            }
            rules.push(rule);
        }

        tracing::debug!(
            "Parsed decision table '{}': {} rules, hit policy {}",
            key,
            rules.len(),
            hit_policy
        );

        Ok(RuleModel {
            key,
            name: YamlParser::get_optional_string(decision, "name"),
            hit_policy,
            aggregation,
            inputs,
            outputs,
            rules,
        })
    }

    fn parse_input(item: &YamlValue) -> Result<InputClause> {
        // Shorthand: a bare expression string
        if let Some(source) = item.as_str() {
            return Ok(InputClause {
                label: None,
                source: source.to_string(),
                expression: ExpressionParser::parse(source)?,
            });
        }

        let source = YamlParser::get_string(item, "expression")?;
        Ok(InputClause {
            label: YamlParser::get_optional_string(item, "label"),
            expression: ExpressionParser::parse(&source)?,
            source,
        })
    }

    fn parse_output(item: &YamlValue) -> Result<OutputClause> {
        let name = YamlParser::get_string(item, "name")?;
        let field_type = match YamlParser::get_optional_string(item, "type") {
            Some(raw) => raw.parse::<FieldType>().map_err(|e| ParseError::InvalidValue {
                field: format!("outputs.{}.type", name),
                message: e.to_string(),
            })?,
            None => FieldType::Any,
        };

        Ok(OutputClause {
            label: YamlParser::get_optional_string(item, "label"),
            name,
            field_type,
        })
    }

    fn parse_rule(item: &YamlValue, index: usize) -> Result<DecisionRule> {
        let id = YamlParser::get_optional_string(item, "id")
            .unwrap_or_else(|| format!("rule_{}", index + 1));

        let conditions = match item.get("when") {
            None | Some(YamlValue::Null) => Vec::new(),
            Some(YamlValue::Sequence(entries)) => entries
                .iter()
                .map(|entry| Self::parse_condition(&id, entry))
                .collect::<Result<Vec<_>>>()?,
            Some(single) => vec![Self::parse_condition(&id, single)?],
        };

        let mut outputs = Vec::new();
        if let Some(then) = YamlParser::get_optional_object(item, "then") {
            for (name, value) in then {
                let name = YamlParser::scalar_to_string(name).ok_or_else(|| {
                    ParseError::InvalidValue {
                        field: format!("rules.{}.then", id),
                        message: "output names must be scalars".to_string(),
                    }
                })?;
                let source = match value {
                    YamlValue::Null => "null".to_string(),
                    other => YamlParser::scalar_to_string(other).ok_or_else(|| {
                        ParseError::InvalidValue {
                            field: format!("rules.{}.then.{}", id, name),
                            message: "output values must be scalar expressions".to_string(),
                        }
                    })?,
                };
                outputs.push(OutputEntry {
                    expression: ExpressionParser::parse(&source)?,
                    name,
                    source,
                });
            }
        }

        Ok(DecisionRule {
            id,
            conditions,
            outputs,
        })
    }

    fn parse_condition(rule_id: &str, entry: &YamlValue) -> Result<ConditionEntry> {
        let source = YamlParser::scalar_to_string(entry).ok_or_else(|| ParseError::InvalidValue {
            field: format!("rules.{}.when", rule_id),
            message: "conditions must be expression strings".to_string(),
        })?;

        Ok(ConditionEntry {
            expression: ExpressionParser::parse(&source)?,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{Expression, Operator};

    const DISCOUNT_TABLE: &str = r#"
decision:
  key: discount
  name: Discount
  hit_policy: first
  inputs:
    - label: Customer age
      expression: customer.age
    - order.total
  outputs:
    - name: discount
      type: number
    - name: reason
      type: string
  rules:
    - id: seniors
      when:
        - customer.age >= 65
      then:
        discount: 0.2
        reason: '"senior"'
    - id: big_orders
      when: order.total > 500
      then:
        discount: 0.1
    - then:
        discount: 0
"#;

    #[test]
    fn test_parse_full_table() {
        let model = DecisionTableParser::parse(DISCOUNT_TABLE).unwrap();

        assert_eq!(model.key, "discount");
        assert_eq!(model.name.as_deref(), Some("Discount"));
        assert_eq!(model.hit_policy, HitPolicy::First);
        assert_eq!(model.inputs.len(), 2);
        assert_eq!(model.inputs[1].source, "order.total");
        assert_eq!(model.outputs[0].field_type, FieldType::Number);
        assert_eq!(model.rules.len(), 3);

        let seniors = &model.rules[0];
        assert_eq!(seniors.id, "seniors");
        assert_eq!(seniors.conditions[0].source, "customer.age >= 65");
        assert_eq!(
            seniors.conditions[0].expression,
            Expression::binary(
                Expression::variable("customer.age"),
                Operator::Ge,
                Expression::literal(65.0)
            )
        );
        assert_eq!(seniors.outputs[1].name, "reason");
        assert_eq!(seniors.outputs[1].expression, Expression::literal("senior"));

        // Single condition shorthand and generated ids
        assert_eq!(model.rules[1].conditions.len(), 1);
        assert_eq!(model.rules[2].id, "rule_3");
        assert!(model.rules[2].conditions.is_empty());
    }

    #[test]
    fn test_defaults() {
        let model = DecisionTableParser::parse(
            r#"
decision:
  key: minimal
  rules: []
"#,
        )
        .unwrap();

        assert_eq!(model.hit_policy, HitPolicy::Collect);
        assert!(model.aggregation.is_none());
        assert!(model.rules.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let err = DecisionTableParser::parse("decision:\n  rules: []").unwrap_err();
        assert!(matches!(err, ParseError::MissingField { ref field } if field == "key"));

        let err = DecisionTableParser::parse("decision:\n  key: k").unwrap_err();
        assert!(matches!(err, ParseError::MissingField { .. }));

        let err = DecisionTableParser::parse("rule:\n  id: x").unwrap_err();
        assert!(matches!(err, ParseError::MissingField { ref field } if field == "decision"));
    }

    #[test]
    fn test_undeclared_output_rejected() {
        let err = DecisionTableParser::parse(
            r#"
decision:
  key: k
  outputs:
    - name: a
  rules:
    - id: r1
      then:
        b: 1
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ParseError::UndeclaredOutput { ref output, .. } if output == "b"));
    }

    #[test]
    fn test_duplicate_rule_ids_rejected() {
        let err = DecisionTableParser::parse(
            r#"
decision:
  key: k
  rules:
    - id: r1
    - id: r1
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ParseError::DuplicateRule(ref id) if id == "r1"));
    }

    #[test]
    fn test_invalid_hit_policy_and_aggregation() {
        let err = DecisionTableParser::parse(
            "decision:\n  key: k\n  hit_policy: priority\n  rules: []",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "hit_policy"));

        let err = DecisionTableParser::parse(
            "decision:\n  key: k\n  hit_policy: first\n  aggregation: sum\n  rules: []",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "aggregation"));
    }

    #[test]
    fn test_invalid_expression_surfaces() {
        let err = DecisionTableParser::parse(
            r#"
decision:
  key: k
  rules:
    - when: "age >"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidExpression { .. }));
    }
}
