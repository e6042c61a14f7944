//! Shared helpers for runtime integration tests

#![allow(dead_code)]

use chrono::Utc;
use std::collections::HashMap;
use tabula_core::{DecisionDefinition, RuleModel, Value, NO_TENANT_ID};
use tabula_parser::DecisionTableParser;

pub fn parse(yaml: &str) -> RuleModel {
    DecisionTableParser::parse(yaml).expect("test table should parse")
}

pub fn definition_for(model: &RuleModel) -> DecisionDefinition {
    DecisionDefinition {
        id: format!("{}:1:test", model.key),
        key: model.key.clone(),
        name: model.name.clone(),
        version: 1,
        deployment_id: "test".to_string(),
        parent_deployment_id: None,
        tenant_id: NO_TENANT_ID.to_string(),
        resource_name: format!("{}.yaml", model.key),
        deployed_at: Utc::now(),
    }
}

pub fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
