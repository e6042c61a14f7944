//! Integration tests for evaluation through DecisionEngine

mod common;

use common::{engine_over, tiers, CallCountingRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tabula_sdk::{
    DecisionEngine, DecisionEngineBuilder, DecisionRequest, EvaluationError, FnPropertyHandler,
    InMemoryDecisionRepository, NewDeployment, SdkError, StaticPropertyHandler, Value,
};

const PRICING: &str = r#"
decision:
  key: pricing
  hit_policy: first
  outputs:
    - name: price
      type: number
    - name: label
      type: string
  rules:
    - id: scored
      when: credit_score(customer) > 700
      then:
        price: base * 0.9
        label: '"preferred"'
    - id: regular
      then:
        price: base
        label: '"regular"'
"#;

const CONTEXT: &str = r#"
decision:
  key: context
  hit_policy: first
  rules:
    - id: echo
      then:
        region: region
        channel: channel
        year_known: sys.year > 2000
"#;

async fn engine_with(yaml: &str, builder: DecisionEngineBuilder) -> DecisionEngine {
    let repository = Arc::new(InMemoryDecisionRepository::new());
    repository
        .deploy(NewDeployment::new("test").with_yaml("decision.yaml", yaml))
        .await
        .unwrap();
    builder.with_repository(repository).build().await.unwrap()
}

async fn tiers_engine(policy: &str) -> DecisionEngine {
    engine_with(&tiers(policy), DecisionEngineBuilder::new()).await
}

fn order(total: f64) -> DecisionRequest {
    DecisionRequest::builder("tiers").with_variable("total", total).build()
}

#[tokio::test]
async fn test_first_hit_policy_fires_one_rule() {
    let engine = tiers_engine("first").await;
    let audit = engine.execute_decision(&order(5000.0)).await.unwrap();

    assert_eq!(audit.fired_rule_ids(), vec!["big"]);
    assert_eq!(audit.firing_records()[0].rule_index, 0);
    assert_eq!(audit.output("tier"), Some(&Value::from("big")));
}

#[tokio::test]
async fn test_collect_hit_policy_fires_all_in_order() {
    let engine = tiers_engine("collect").await;
    let audit = engine.execute_decision(&order(5000.0)).await.unwrap();

    assert_eq!(audit.fired_rule_ids(), vec!["big", "huge", "any_order"]);
    let indexes: Vec<usize> = audit.firing_records().iter().map(|r| r.rule_index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(audit.output("tier"), Some(&Value::from("any")));
}

#[tokio::test]
async fn test_no_matching_rule_is_success() {
    let engine = tiers_engine("collect").await;
    let audit = engine.execute_decision(&order(0.0)).await.unwrap();

    assert!(!audit.has_matches());
    assert!(audit.outputs().is_empty());
    assert_eq!(audit.rule_traces().len(), 3);
}

#[tokio::test]
async fn test_unique_violation_is_evaluation_error() {
    let engine = tiers_engine("unique").await;
    let err = engine.execute_decision(&order(500.0)).await.unwrap_err();
    assert!(matches!(
        err,
        SdkError::Evaluation(EvaluationError::HitPolicyViolation { .. })
    ));

    let audit = engine.execute_decision(&order(50.0)).await.unwrap();
    assert_eq!(audit.fired_rule_ids(), vec!["any_order"]);
}

#[tokio::test]
async fn test_result_only_execution() {
    let engine = tiers_engine("collect").await;

    let results = engine.execute(&order(500.0)).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["tier"], Value::from("big"));
    assert_eq!(results[1]["tier"], Value::from("any"));

    let single = engine.execute_with_single_result(&order(50.0)).await.unwrap();
    assert_eq!(single.unwrap()["tier"], Value::from("any"));

    assert!(engine
        .execute_with_single_result(&order(-1.0))
        .await
        .unwrap()
        .is_none());

    let err = engine
        .execute_with_single_result(&order(500.0))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::MultipleResults { count: 2, .. }));
}

#[tokio::test]
async fn test_unknown_function_names_the_function() {
    let engine = engine_with(PRICING, DecisionEngineBuilder::new()).await;
    let request = DecisionRequest::builder("pricing")
        .with_variable("base", 100.0)
        .build();

    let err = engine.execute_decision(&request).await.unwrap_err();
    assert!(err.to_string().contains("credit_score"));
    match err {
        SdkError::Evaluation(e) => assert!(matches!(
            e.root_cause(),
            EvaluationError::UnknownFunction { name } if name == "credit_score"
        )),
        other => panic!("expected evaluation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_function_shadows_engine_function() {
    let builder = DecisionEngineBuilder::new().with_custom_function("credit_score", |_: &[Value]| {
        Ok(Value::Number(800.0))
    });
    let engine = engine_with(PRICING, builder).await;

    let request = DecisionRequest::builder("pricing")
        .with_variable("base", 100.0)
        .build();
    let audit = engine.execute_decision(&request).await.unwrap();
    assert_eq!(audit.fired_rule_ids(), vec!["scored"]);
    assert_eq!(audit.output("price"), Some(&Value::Number(90.0)));

    let request = DecisionRequest::builder("pricing")
        .with_variable("base", 100.0)
        .with_custom_function("credit_score", |_: &[Value]| Ok(Value::Number(500.0)))
        .build();
    let audit = engine.execute_decision(&request).await.unwrap();
    assert_eq!(audit.fired_rule_ids(), vec!["regular"]);
    assert_eq!(audit.output("label"), Some(&Value::from("regular")));
}

#[tokio::test]
async fn test_property_handler_order() {
    let builder = DecisionEngineBuilder::new()
        .add_before_default_handler(Arc::new(
            StaticPropertyHandler::new("before")
                .with_property("region", "us")
                .with_property("channel", "web"),
        ))
        .add_after_default_handler(Arc::new(
            StaticPropertyHandler::new("after").with_property("region", "eu"),
        ));
    let engine = engine_with(CONTEXT, builder).await;
    assert_eq!(engine.property_handler_names(), vec!["before", "system", "after"]);

    let audit = engine
        .execute_decision(&DecisionRequest::builder("context").build())
        .await
        .unwrap();
    assert_eq!(audit.output("region"), Some(&Value::from("eu")));
    assert_eq!(audit.output("channel"), Some(&Value::from("web")));
    assert_eq!(audit.output("year_known"), Some(&Value::Bool(true)));

    // Request handlers run last; caller variables beat every handler
    let request = DecisionRequest::builder("context")
        .with_variable("channel", "api")
        .with_property_handler(Arc::new(FnPropertyHandler::new("request", |_: &HashMap<String, Value>| {
            Ok(HashMap::from([
                ("region".to_string(), Value::from("apac")),
                ("channel".to_string(), Value::from("batch")),
            ]))
        })))
        .build();
    let audit = engine.execute_decision(&request).await.unwrap();
    assert_eq!(audit.output("region"), Some(&Value::from("apac")));
    assert_eq!(audit.output("channel"), Some(&Value::from("api")));
}

#[tokio::test]
async fn test_system_properties_can_be_disabled() {
    let builder = DecisionEngineBuilder::new().enable_system_properties(false);
    let engine = engine_with(CONTEXT, builder).await;
    assert!(engine.property_handler_names().is_empty());

    let audit = engine
        .execute_decision(&DecisionRequest::builder("context").build())
        .await
        .unwrap();
    // `sys.year` is missing, so the comparison is false
    assert_eq!(audit.output("year_known"), Some(&Value::Bool(false)));
}

#[tokio::test]
async fn test_audit_snapshot() {
    let repository = Arc::new(CallCountingRepository::new());
    repository
        .inner()
        .deploy(NewDeployment::new("test").with_yaml("tiers.yaml", tiers("first")))
        .await
        .unwrap();
    let engine = engine_over(repository).await;

    let audit = engine.execute_decision(&order(150.0)).await.unwrap();
    assert!(audit.execution_id().starts_with("exec_"));
    assert!(audit.completed_at() >= audit.started_at());
    assert_eq!(audit.decision().key, "tiers");
    assert_eq!(audit.variables()["total"], Value::Number(150.0));
    assert_eq!(audit.decision_results().len(), 1);

    let json = audit.to_json().unwrap();
    assert!(json.contains("\"execution_id\""));
    assert!(json.contains("\"big\""));
}
