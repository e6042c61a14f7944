//! In-memory decision repository
//!
//! Holds deployments in process. Used by tests and by embedders that publish
//! decision tables programmatically instead of from disk.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tabula_core::{normalize_tenant, DecisionDefinition, RuleModel};
use tabula_parser::DecisionTableParser;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::index::DefinitionIndex;
use crate::models::Deployment;
use crate::traits::DecisionRepository;

/// Source of one decision table inside a deployment
#[derive(Debug, Clone)]
pub enum DecisionResource {
    /// YAML decision table document, parsed on every model load
    Yaml(String),
    /// Already built rule model
    Model(RuleModel),
}

impl DecisionResource {
    fn parse(&self, resource_name: &str) -> RepositoryResult<RuleModel> {
        match self {
            DecisionResource::Yaml(source) => {
                DecisionTableParser::parse(source).map_err(|source| RepositoryError::Parse {
                    resource: resource_name.to_string(),
                    source,
                })
            }
            DecisionResource::Model(model) => Ok(model.clone()),
        }
    }
}

/// A deployment waiting to be published
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub name: String,
    pub parent_deployment_id: Option<String>,
    pub tenant_id: Option<String>,
    /// `(resource name, resource)` pairs
    pub resources: Vec<(String, DecisionResource)>,
}

impl NewDeployment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_deployment_id: None,
            tenant_id: None,
            resources: Vec::new(),
        }
    }

    pub fn with_parent_deployment_id(mut self, parent_deployment_id: impl Into<String>) -> Self {
        self.parent_deployment_id = Some(parent_deployment_id.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_yaml(mut self, resource_name: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.resources
            .push((resource_name.into(), DecisionResource::Yaml(yaml.into())));
        self
    }

    pub fn with_model(mut self, resource_name: impl Into<String>, model: RuleModel) -> Self {
        self.resources
            .push((resource_name.into(), DecisionResource::Model(model)));
        self
    }
}

#[derive(Default)]
struct MemoryState {
    index: DefinitionIndex,
    deployments: Vec<Deployment>,
    resources: HashMap<String, (String, DecisionResource)>,
}

/// In-memory repository
///
/// ```rust
/// use tabula_repository::{DecisionRepository, InMemoryDecisionRepository, NewDeployment};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let repo = InMemoryDecisionRepository::new();
/// repo.deploy(NewDeployment::new("pricing").with_yaml(
///     "discount.yaml",
///     "decision:\n  key: discount\n  rules: []\n",
/// ))
/// .await?;
///
/// let latest = repo.find_latest("discount", "").await?.unwrap();
/// assert_eq!(latest.version, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct InMemoryDecisionRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryDecisionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a deployment
    ///
    /// Every resource is parsed up front; if any fails, nothing is published.
    /// Each definition gets the next version of its key within the tenant.
    pub async fn deploy(&self, deployment: NewDeployment) -> RepositoryResult<Deployment> {
        if deployment.resources.is_empty() {
            return Err(RepositoryError::InvalidDeployment(format!(
                "deployment '{}' has no resources",
                deployment.name
            )));
        }

        let mut parsed = Vec::with_capacity(deployment.resources.len());
        let mut keys = HashSet::new();
        for (resource_name, resource) in &deployment.resources {
            let model = resource.parse(resource_name)?;
            if !keys.insert(model.key.clone()) {
                return Err(RepositoryError::InvalidDeployment(format!(
                    "decision key '{}' appears more than once in deployment '{}'",
                    model.key, deployment.name
                )));
            }
            parsed.push(model);
        }

        let tenant_id = normalize_tenant(deployment.tenant_id.as_deref()).to_string();
        let published = Deployment {
            id: Uuid::new_v4().to_string(),
            name: deployment.name,
            parent_deployment_id: deployment.parent_deployment_id,
            tenant_id,
            deployed_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        for ((resource_name, resource), model) in deployment.resources.into_iter().zip(parsed) {
            let version = state.index.next_version(&model.key, &published.tenant_id);
            let definition = DecisionDefinition {
                id: Uuid::new_v4().to_string(),
                key: model.key.clone(),
                name: model.name.clone(),
                version,
                deployment_id: published.id.clone(),
                parent_deployment_id: published.parent_deployment_id.clone(),
                tenant_id: published.tenant_id.clone(),
                resource_name: resource_name.clone(),
                deployed_at: published.deployed_at,
            };

            tracing::debug!(
                "Deployed decision '{}' version {} as {}",
                definition.key,
                definition.version,
                definition.id
            );
            state
                .resources
                .insert(definition.id.clone(), (resource_name, resource));
            state.index.insert(definition);
        }
        state.deployments.push(published.clone());

        tracing::info!(
            "Published deployment '{}' ({}) with {} decision(s)",
            published.name,
            published.id,
            keys.len()
        );

        Ok(published)
    }

    /// All deployments in publication order
    pub async fn deployments(&self) -> Vec<Deployment> {
        self.state.read().await.deployments.clone()
    }

    /// Number of deployed definitions
    pub async fn definition_count(&self) -> usize {
        self.state.read().await.index.len()
    }
}

#[async_trait]
impl DecisionRepository for InMemoryDecisionRepository {
    async fn find_latest(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self.state.read().await.index.latest(key, tenant_id).cloned())
    }

    async fn find_by_parent_deployment(
        &self,
        key: &str,
        parent_deployment_id: &str,
        tenant_id: Option<&str>,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self
            .state
            .read()
            .await
            .index
            .latest_for_parent(key, parent_deployment_id, tenant_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self.state.read().await.index.by_id(id).cloned())
    }

    async fn load_rule_model(&self, definition_id: &str) -> RepositoryResult<RuleModel> {
        let state = self.state.read().await;
        let (resource_name, resource) =
            state
                .resources
                .get(definition_id)
                .ok_or_else(|| RepositoryError::DefinitionNotFound {
                    id: definition_id.to_string(),
                })?;
        resource.parse(resource_name)
    }
}
