//! File system based decision repository
//!
//! Each deployment is a directory under the repository root:
//!
//! ```text
//! <root>/
//!   2024-05-01-pricing/
//!     deployment.yaml      # name, parent_deployment_id, tenant_id, deployed_at
//!     discount.yaml        # one decision table per file
//!     shipping.yml
//! ```
//!
//! The definition index is built once by [`FileSystemDecisionRepository::open`].
//! Rule models are read and parsed from disk on every load.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tabula_core::{normalize_tenant, DecisionDefinition, RuleModel};
use tabula_parser::DecisionTableParser;
use tokio::fs;

use crate::error::{RepositoryError, RepositoryResult};
use crate::index::DefinitionIndex;
use crate::models::Deployment;
use crate::traits::DecisionRepository;

/// Descriptor file name inside each deployment directory
pub const DEPLOYMENT_DESCRIPTOR: &str = "deployment.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeploymentDescriptor {
    name: Option<String>,
    parent_deployment_id: Option<String>,
    tenant_id: Option<String>,
    deployed_at: Option<DateTime<Utc>>,
}

struct DeploymentDir {
    path: PathBuf,
    deployment: Deployment,
}

/// Read-only repository over deployment directories
pub struct FileSystemDecisionRepository {
    root_path: PathBuf,
    index: DefinitionIndex,
    deployments: Vec<Deployment>,
    /// Definition id to resource file
    resources: HashMap<String, PathBuf>,
}

impl FileSystemDecisionRepository {
    /// Scan `root_path` and build the definition index
    ///
    /// Directories without a descriptor and decision files that fail to
    /// parse are skipped with a warning.
    pub async fn open<P: AsRef<Path>>(root_path: P) -> RepositoryResult<Self> {
        let path = root_path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(RepositoryError::InvalidPath {
                path: path.to_path_buf(),
            });
        }
        let root_path = path.absolutize()?.to_path_buf();

        let mut dirs = Self::scan_deployments(&root_path).await?;
        dirs.sort_by(|a, b| {
            a.deployment
                .deployed_at
                .cmp(&b.deployment.deployed_at)
                .then_with(|| a.deployment.id.cmp(&b.deployment.id))
        });

        let mut repo = Self {
            root_path,
            index: DefinitionIndex::new(),
            deployments: Vec::with_capacity(dirs.len()),
            resources: HashMap::new(),
        };
        for dir in dirs {
            repo.index_deployment(dir).await?;
        }

        tracing::info!(
            "Opened decision repository at {}: {} deployment(s), {} definition(s)",
            repo.root_path.display(),
            repo.deployments.len(),
            repo.index.len()
        );

        Ok(repo)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Deployments in version assignment order
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    pub fn definition_count(&self) -> usize {
        self.index.len()
    }

    async fn scan_deployments(root: &Path) -> RepositoryResult<Vec<DeploymentDir>> {
        let mut dirs = Vec::new();
        let mut entries = fs::read_dir(root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            let descriptor_path = path.join(DEPLOYMENT_DESCRIPTOR);
            let content = match fs::read_to_string(&descriptor_path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!("Skipping {}: no {}", path.display(), DEPLOYMENT_DESCRIPTOR);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let descriptor: DeploymentDescriptor = if content.trim().is_empty() {
                DeploymentDescriptor::default()
            } else {
                match serde_yaml::from_str(&content) {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        tracing::warn!("Skipping {}: invalid descriptor: {}", path.display(), e);
                        continue;
                    }
                }
            };

            let deployed_at = match descriptor.deployed_at {
                Some(at) => at,
                None => entry
                    .metadata()
                    .await?
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now()),
            };

            dirs.push(DeploymentDir {
                path,
                deployment: Deployment {
                    name: descriptor.name.unwrap_or_else(|| id.clone()),
                    id,
                    parent_deployment_id: descriptor.parent_deployment_id,
                    tenant_id: normalize_tenant(descriptor.tenant_id.as_deref()).to_string(),
                    deployed_at,
                },
            });
        }

        Ok(dirs)
    }

    async fn index_deployment(&mut self, dir: DeploymentDir) -> RepositoryResult<()> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&dir.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_decision_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let deployment = dir.deployment;
        let mut keys = HashSet::new();
        for path in files {
            let resource_name = relative_name(&self.root_path, &path);
            let model = match Self::parse_file(&path, &resource_name).await {
                Ok(model) => model,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", resource_name, e);
                    continue;
                }
            };
            if !keys.insert(model.key.clone()) {
                tracing::warn!(
                    "Skipping {}: decision key '{}' already defined in deployment {}",
                    resource_name,
                    model.key,
                    deployment.id
                );
                continue;
            }

            let version = self.index.next_version(&model.key, &deployment.tenant_id);
            let definition = DecisionDefinition {
                id: format!("{}:{}:{}", model.key, version, deployment.id),
                key: model.key,
                name: model.name,
                version,
                deployment_id: deployment.id.clone(),
                parent_deployment_id: deployment.parent_deployment_id.clone(),
                tenant_id: deployment.tenant_id.clone(),
                resource_name,
                deployed_at: deployment.deployed_at,
            };
            tracing::debug!(
                "Indexed decision '{}' version {} from {}",
                definition.key,
                definition.version,
                definition.resource_name
            );
            self.resources.insert(definition.id.clone(), path);
            self.index.insert(definition);
        }

        self.deployments.push(deployment);
        Ok(())
    }

    async fn parse_file(path: &Path, resource_name: &str) -> RepositoryResult<RuleModel> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepositoryError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                RepositoryError::Io(e)
            }
        })?;

        DecisionTableParser::parse(&content).map_err(|source| RepositoryError::Parse {
            resource: resource_name.to_string(),
            source,
        })
    }
}

fn is_decision_file(path: &Path) -> bool {
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let is_descriptor = path.file_name().and_then(|n| n.to_str()) == Some(DEPLOYMENT_DESCRIPTOR);
    is_yaml && !is_descriptor && path.is_file()
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[async_trait]
impl DecisionRepository for FileSystemDecisionRepository {
    async fn find_latest(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self.index.latest(key, tenant_id).cloned())
    }

    async fn find_by_parent_deployment(
        &self,
        key: &str,
        parent_deployment_id: &str,
        tenant_id: Option<&str>,
    ) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self
            .index
            .latest_for_parent(key, parent_deployment_id, tenant_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DecisionDefinition>> {
        Ok(self.index.by_id(id).cloned())
    }

    async fn load_rule_model(&self, definition_id: &str) -> RepositoryResult<RuleModel> {
        let definition =
            self.index
                .by_id(definition_id)
                .ok_or_else(|| RepositoryError::DefinitionNotFound {
                    id: definition_id.to_string(),
                })?;
        let path = self
            .resources
            .get(definition_id)
            .ok_or_else(|| RepositoryError::DefinitionNotFound {
                id: definition_id.to_string(),
            })?;

        Self::parse_file(path, &definition.resource_name).await
    }
}
