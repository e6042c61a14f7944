//! Configuration types for DecisionEngine

use serde::{Deserialize, Serialize};
use std::path::Path;
use tabula_repository::{CacheConfig, RepositoryConfig};
use tabula_runtime::EvaluationConfig;

use crate::error::{Result, SdkError};
use crate::resolver::ResolverConfig;

/// Main engine configuration
///
/// Every section has a default, so a YAML document only needs the parts it
/// changes:
///
/// ```yaml
/// repository:
///   source: file_system
///   base_path: deployments
/// cache:
///   max_entries: 200
/// resolver:
///   fallback_to_default_tenant: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where decision definitions come from
    pub repository: RepositoryConfig,

    /// Rule model cache
    pub cache: CacheConfig,

    /// Resolution fallbacks
    pub resolver: ResolverConfig,

    /// Rule evaluation settings
    pub evaluation: EvaluationConfig,

    /// Register the `sys.*` property handler
    pub system_properties: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            cache: CacheConfig::default(),
            resolver: ResolverConfig::default(),
            evaluation: EvaluationConfig::default(),
            system_properties: true,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| SdkError::Config(format!("Invalid engine configuration: {}", e)))
    }

    /// Read and parse a YAML configuration file
    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SdkError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Set repository configuration
    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.repository = repository;
        self
    }

    /// Set cache configuration
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set resolver configuration
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set evaluation configuration
    pub fn with_evaluation(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Enable or disable the `sys.*` properties
    pub fn with_system_properties(mut self, enabled: bool) -> Self {
        self.system_properties = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.repository
            .validate()
            .map_err(|e| SdkError::Config(e.to_string()))
    }
}
