//! Unit tests for decision table documents
//!
//! Exercises the public parser API on complete documents.

use tabula_core::{Aggregation, Expression, FieldType, HitPolicy, Operator, Value};
use tabula_parser::*;

// =============================================================================
// Decision Table Tests
// =============================================================================

#[test]
fn test_parse_documented_format() {
    let yaml = r#"
decision:
  key: discount
  name: Discount
  hit_policy: first
  inputs:
    - label: Customer age
      expression: customer.age
  outputs:
    - name: discount
      type: number
  rules:
    - id: adults
      when: ["customer.age >= 18"]
      then:
        discount: "0.1"
"#;

    let result = DecisionTableParser::parse(yaml);
    assert!(result.is_ok(), "Failed to parse table: {:?}", result.err());

    let model = result.unwrap();
    assert_eq!(model.key, "discount");
    assert_eq!(model.name.as_deref(), Some("Discount"));
    assert_eq!(model.hit_policy, HitPolicy::First);
    assert_eq!(model.inputs[0].label.as_deref(), Some("Customer age"));
    assert_eq!(model.output("discount").unwrap().field_type, FieldType::Number);

    let rule = &model.rules[0];
    assert_eq!(rule.id, "adults");
    assert_eq!(rule.conditions[0].source, "customer.age >= 18");
    assert_eq!(rule.outputs[0].expression, Expression::Literal(Value::Number(0.1)));
}

#[test]
fn test_single_condition_string() {
    let yaml = r#"
decision:
  key: shipping
  rules:
    - when: weight > 10 && country == "US"
      then:
        cost: 20
"#;

    let model = DecisionTableParser::parse(yaml).unwrap();
    let rule = &model.rules[0];
    assert_eq!(rule.id, "rule_1");
    assert_eq!(rule.conditions.len(), 1);
    assert!(matches!(
        rule.conditions[0].expression,
        Expression::Binary { op: Operator::And, .. }
    ));
}

#[test]
fn test_collect_with_aggregation() {
    let yaml = r#"
decision:
  key: score
  hit_policy: collect
  aggregation: sum
  outputs:
    - name: points
      type: number
  rules:
    - when: age < 25
      then:
        points: 10
    - when: claims > 2
      then:
        points: 25
"#;

    let model = DecisionTableParser::parse(yaml).unwrap();
    assert_eq!(model.hit_policy, HitPolicy::Collect);
    assert_eq!(model.aggregation, Some(Aggregation::Sum));
    assert_eq!(model.rules.len(), 2);
    assert_eq!(model.rules[1].id, "rule_2");
}

#[test]
fn test_rule_order_policy_and_null_output() {
    let yaml = r#"
decision:
  key: tags
  hit_policy: rule_order
  rules:
    - then:
        tag: '"first"'
        note:
"#;

    let model = DecisionTableParser::parse(yaml).unwrap();
    assert_eq!(model.hit_policy, HitPolicy::RuleOrder);
    assert!(model.rules[0].conditions.is_empty());
    let note = model.rules[0].outputs.iter().find(|o| o.name == "note").unwrap();
    assert_eq!(note.expression, Expression::Literal(Value::Null));
}

#[test]
fn test_empty_rules_list_is_valid() {
    let model = DecisionTableParser::parse("decision:\n  key: empty\n  rules: []\n").unwrap();
    assert!(model.rules.is_empty());
    assert_eq!(model.hit_policy, HitPolicy::default());
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_missing_decision_section() {
    let err = DecisionTableParser::parse("rules: []\n").unwrap_err();
    assert!(matches!(err, ParseError::MissingField { ref field } if field == "decision"));
}

#[test]
fn test_aggregation_requires_collect() {
    let yaml = r#"
decision:
  key: score
  hit_policy: first
  aggregation: max
  rules: []
"#;
    let err = DecisionTableParser::parse(yaml).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "aggregation"));
}

#[test]
fn test_unknown_output_type() {
    let yaml = r#"
decision:
  key: typed
  outputs:
    - name: when
      type: timestamp
  rules: []
"#;
    let err = DecisionTableParser::parse(yaml).unwrap_err();
    assert!(err.to_string().contains("outputs.when.type"));
}

#[test]
fn test_broken_condition_expression() {
    let yaml = r#"
decision:
  key: broken
  rules:
    - when: "total >"
      then:
        ok: true
"#;
    let err = DecisionTableParser::parse(yaml).unwrap_err();
    assert!(matches!(err, ParseError::InvalidExpression { .. }));
}

#[test]
fn test_malformed_yaml() {
    let err = DecisionTableParser::parse("decision: [").unwrap_err();
    assert!(matches!(err, ParseError::YamlError(_)));
}
