//! Decision resolution
//!
//! Picks the definition a request refers to and obtains its rule model from
//! the shared cache. Selectors are applied in a fixed order:
//!
//! 1. an explicit definition id, ignoring key, tenant and parent filters
//! 2. a parent deployment id, picking the latest definition of the key
//!    deployed with that parent
//! 3. otherwise, the latest definition of the key within the tenant

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabula_core::{normalize_tenant, DecisionDefinition, RuleModel, NO_TENANT_ID};
use tabula_repository::{DecisionRepository, RuleModelCache};

use crate::error::{Result, SdkError};
use crate::request::DecisionRequest;

/// Fallbacks applied when a scoped lookup finds nothing
///
/// Both are off by default, which makes a scoped miss a `NotFound` error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Resolve the latest definition when no definition was deployed with the parent
    pub fallback_to_latest_on_parent_miss: bool,
    /// Retry a tenant-scoped lookup without a tenant
    pub fallback_to_default_tenant: bool,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_to_latest_on_parent_miss(mut self, enabled: bool) -> Self {
        self.fallback_to_latest_on_parent_miss = enabled;
        self
    }

    pub fn with_fallback_to_default_tenant(mut self, enabled: bool) -> Self {
        self.fallback_to_default_tenant = enabled;
        self
    }
}

/// Which selector produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    ExplicitId,
    ParentDeployment,
    Latest,
}

/// A definition together with its rule model
#[derive(Debug, Clone)]
pub struct ResolvedDecision {
    pub definition: DecisionDefinition,
    pub model: Arc<RuleModel>,
    pub strategy: ResolutionStrategy,
}

/// Resolves requests against a repository
pub struct DecisionResolver {
    repository: Arc<dyn DecisionRepository>,
    cache: Arc<RuleModelCache>,
    config: ResolverConfig,
}

impl DecisionResolver {
    pub fn new(
        repository: Arc<dyn DecisionRepository>,
        cache: Arc<RuleModelCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<RuleModelCache> {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn DecisionRepository> {
        &self.repository
    }

    /// Resolve a validated request to a definition and its rule model
    ///
    /// The key is matched with surrounding whitespace trimmed.
    pub async fn resolve(&self, request: &DecisionRequest) -> Result<ResolvedDecision> {
        let (definition, strategy) = self
            .resolve_definition(
                request.decision_key().map(str::trim).unwrap_or_default(),
                request.decision_id(),
                request.parent_deployment_id(),
                request.tenant_id(),
            )
            .await?;

        let model = self.load_model(&definition).await?;

        Ok(ResolvedDecision {
            definition,
            model,
            strategy,
        })
    }

    /// Select the definition only, without touching the cache
    pub async fn resolve_definition(
        &self,
        key: &str,
        decision_id: Option<&str>,
        parent_deployment_id: Option<&str>,
        tenant_id: Option<&str>,
    ) -> Result<(DecisionDefinition, ResolutionStrategy)> {
        if let Some(id) = decision_id {
            return self.by_id(key, id).await;
        }

        if key.trim().is_empty() {
            return Err(SdkError::NotFound("no decision key given".to_string()));
        }

        if let Some(parent) = parent_deployment_id {
            if let Some(definition) = self.by_parent(key, parent, tenant_id).await? {
                return Ok((definition, ResolutionStrategy::ParentDeployment));
            }
            if !self.config.fallback_to_latest_on_parent_miss {
                return Err(SdkError::NotFound(format!(
                    "no decision '{}' deployed with parent deployment '{}'{}",
                    key,
                    parent,
                    tenant_suffix(tenant_id)
                )));
            }
            tracing::debug!(
                "No '{}' deployed with parent '{}', falling back to latest",
                key,
                parent
            );
        }

        self.latest(key, tenant_id)
            .await
            .map(|definition| (definition, ResolutionStrategy::Latest))
    }

    async fn by_id(&self, key: &str, id: &str) -> Result<(DecisionDefinition, ResolutionStrategy)> {
        let definition = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| SdkError::NotFound(format!("no decision definition with id '{}'", id)))?;

        if !key.is_empty() && definition.key != key {
            tracing::warn!(
                "Definition '{}' has key '{}' but the request asked for '{}', using the id",
                id,
                definition.key,
                key
            );
        }
        tracing::debug!("Resolved '{}' by explicit id", id);
        Ok((definition, ResolutionStrategy::ExplicitId))
    }

    async fn by_parent(
        &self,
        key: &str,
        parent: &str,
        tenant_id: Option<&str>,
    ) -> Result<Option<DecisionDefinition>> {
        let found = self
            .repository
            .find_by_parent_deployment(key, parent, tenant_id)
            .await?;
        if found.is_some() {
            tracing::debug!("Resolved '{}' through parent deployment '{}'", key, parent);
            return Ok(found);
        }

        match tenant_id {
            Some(tenant) if tenant != NO_TENANT_ID && self.config.fallback_to_default_tenant => {
                tracing::debug!(
                    "No '{}' with parent '{}' for tenant '{}', retrying without tenant",
                    key,
                    parent,
                    tenant
                );
                Ok(self
                    .repository
                    .find_by_parent_deployment(key, parent, Some(NO_TENANT_ID))
                    .await?)
            }
            _ => Ok(None),
        }
    }

    async fn latest(&self, key: &str, tenant_id: Option<&str>) -> Result<DecisionDefinition> {
        let tenant = normalize_tenant(tenant_id);
        if let Some(definition) = self.repository.find_latest(key, tenant).await? {
            tracing::debug!("Resolved '{}' to latest version {}", key, definition.version);
            return Ok(definition);
        }

        if tenant != NO_TENANT_ID && self.config.fallback_to_default_tenant {
            tracing::debug!(
                "No '{}' for tenant '{}', retrying without tenant",
                key,
                tenant
            );
            if let Some(definition) = self.repository.find_latest(key, NO_TENANT_ID).await? {
                return Ok(definition);
            }
        }

        Err(SdkError::NotFound(format!(
            "no decision '{}'{}",
            key,
            tenant_suffix(tenant_id)
        )))
    }

    async fn load_model(&self, definition: &DecisionDefinition) -> Result<Arc<RuleModel>> {
        self.cache
            .get_or_load(self.repository.as_ref(), &definition.id)
            .await
            .map_err(|source| SdkError::CacheLoad {
                definition_id: definition.id.clone(),
                source,
            })
    }
}

fn tenant_suffix(tenant_id: Option<&str>) -> String {
    match tenant_id {
        Some(tenant) if tenant != NO_TENANT_ID => format!(" for tenant '{}'", tenant),
        _ => String::new(),
    }
}
