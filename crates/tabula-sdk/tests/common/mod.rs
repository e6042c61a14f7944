//! Shared helpers for SDK integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tabula_core::{DecisionDefinition, RuleModel};
use tabula_repository::{RepositoryError, RepositoryResult};
use tabula_sdk::{DecisionEngine, DecisionEngineBuilder, DecisionRepository, InMemoryDecisionRepository};

pub const DISCOUNT_V1: &str = r#"
decision:
  key: discount
  hit_policy: first
  rules:
    - id: v1
      then:
        discount: 0.01
"#;

pub const DISCOUNT_V2: &str = r#"
decision:
  key: discount
  hit_policy: first
  rules:
    - id: v2
      then:
        discount: 0.02
"#;

pub const DISCOUNT_V3: &str = r#"
decision:
  key: discount
  hit_policy: first
  rules:
    - id: v3
      then:
        discount: 0.03
"#;

/// Two rules that both match orders over 100
pub const TIERS: &str = r#"
decision:
  key: tiers
  hit_policy: {policy}
  outputs:
    - name: tier
      type: string
  rules:
    - id: big
      when: total > 100
      then:
        tier: '"big"'
    - id: huge
      when: total > 1000
      then:
        tier: '"huge"'
    - id: any_order
      when: total > 0
      then:
        tier: '"any"'
"#;

pub fn tiers(policy: &str) -> String {
    TIERS.replace("{policy}", policy)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wraps an in-memory repository and counts every call made to it
#[derive(Default)]
pub struct CallCountingRepository {
    inner: InMemoryDecisionRepository,
    latest_calls: AtomicUsize,
    parent_calls: AtomicUsize,
    id_calls: AtomicUsize,
    loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    load_delay: Option<Duration>,
}

impl CallCountingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every load so concurrent callers overlap
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// Fail the next `count` loads
    pub fn failing(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn inner(&self) -> &InMemoryDecisionRepository {
        &self.inner
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
            + self.parent_calls.load(Ordering::SeqCst)
            + self.id_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.lookup_count() + self.load_count()
    }
}

#[async_trait]
impl DecisionRepository for CallCountingRepository {
    async fn find_latest(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_latest(key, tenant_id).await
    }

    async fn find_by_parent_deployment(
        &self,
        key: &str,
        parent_deployment_id: &str,
        tenant_id: Option<&str>,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        self.parent_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .find_by_parent_deployment(key, parent_deployment_id, tenant_id)
            .await
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DecisionDefinition>> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn load_rule_model(&self, definition_id: &str) -> RepositoryResult<RuleModel> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RepositoryError::DefinitionNotFound {
                id: definition_id.to_string(),
            });
        }
        self.inner.load_rule_model(definition_id).await
    }
}

pub async fn engine_over(repository: Arc<CallCountingRepository>) -> DecisionEngine {
    DecisionEngineBuilder::new()
        .with_repository(repository)
        .build()
        .await
        .unwrap()
}
