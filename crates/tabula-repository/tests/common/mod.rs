//! Shared helpers for repository integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tabula_core::{DecisionDefinition, RuleModel, NO_TENANT_ID};
use tabula_repository::{DecisionRepository, RepositoryError, RepositoryResult};

pub fn definition(id: &str, key: &str, version: u32) -> DecisionDefinition {
    DecisionDefinition {
        id: id.to_string(),
        key: key.to_string(),
        name: None,
        version,
        deployment_id: format!("dep-{}", id),
        parent_deployment_id: None,
        tenant_id: NO_TENANT_ID.to_string(),
        resource_name: format!("{}.yaml", key),
        deployed_at: Utc::now(),
    }
}

/// Repository that counts rule model loads and can be told to fail them
#[derive(Default)]
pub struct CountingRepository {
    definitions: HashMap<String, DecisionDefinition>,
    pub loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    load_delay: Option<Duration>,
}

impl CountingRepository {
    pub fn new(definitions: Vec<DecisionDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.id.clone(), d)).collect(),
            ..Default::default()
        }
    }

    /// Make every load take `delay`, widening the window for racing callers
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// Fail the next `count` loads
    pub fn failing(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionRepository for CountingRepository {
    async fn find_latest(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self
            .definitions
            .values()
            .filter(|d| d.key == key && d.tenant_id == tenant_id)
            .max_by_key(|d| d.version)
            .cloned())
    }

    async fn find_by_parent_deployment(
        &self,
        _key: &str,
        _parent_deployment_id: &str,
        _tenant_id: Option<&str>,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(None)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self.definitions.get(id).cloned())
    }

    async fn load_rule_model(&self, definition_id: &str) -> RepositoryResult<RuleModel> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(RepositoryError::NotFound {
                path: format!("{}.yaml", definition_id),
            });
        }

        let definition =
            self.definitions
                .get(definition_id)
                .ok_or_else(|| RepositoryError::DefinitionNotFound {
                    id: definition_id.to_string(),
                })?;
        Ok(RuleModel::new(definition.key.clone()))
    }
}
