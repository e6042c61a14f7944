//! Builder pattern for DecisionEngine

use std::sync::Arc;
use tabula_core::Value;
use tabula_repository::{
    open_repository, CacheConfig, DecisionRepository, RepositoryConfig, RepositoryError, RuleModelCache,
};
use tabula_runtime::{
    EvaluationConfig, FunctionRegistry, PropertyHandlerRef, RuleEngineExecutor, SystemPropertyHandler,
};

use crate::config::EngineConfig;
use crate::engine::DecisionEngine;
use crate::error::{Result, SdkError};
use crate::resolver::{DecisionResolver, ResolverConfig};

/// Builder for DecisionEngine
///
/// # Example
///
/// ```rust,ignore
/// use tabula_sdk::{DecisionEngineBuilder, RepositoryConfig};
///
/// // From deployment directories on disk
/// let engine = DecisionEngineBuilder::new()
///     .with_repository_config(RepositoryConfig::file_system("deployments"))
///     .build()
///     .await?;
///
/// // Over a repository the caller keeps publishing to
/// let repository = Arc::new(InMemoryDecisionRepository::new());
/// let engine = DecisionEngineBuilder::new()
///     .with_repository(repository.clone())
///     .with_custom_function("credit_score", score)
///     .build()
///     .await?;
/// ```
pub struct DecisionEngineBuilder {
    config: EngineConfig,
    repository: Option<Arc<dyn DecisionRepository>>,
    cache: Option<Arc<RuleModelCache>>,
    functions: FunctionRegistry,
    before_default_handlers: Vec<PropertyHandlerRef>,
    after_default_handlers: Vec<PropertyHandlerRef>,
}

impl DecisionEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            repository: None,
            cache: None,
            functions: FunctionRegistry::new(),
            before_default_handlers: Vec::new(),
            after_default_handlers: Vec::new(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already opened repository
    ///
    /// Takes precedence over the repository configuration.
    pub fn with_repository(mut self, repository: Arc<dyn DecisionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Open the repository from configuration at build time
    pub fn with_repository_config(mut self, config: RepositoryConfig) -> Self {
        self.config.repository = config;
        self
    }

    /// Share a rule model cache with other engines
    pub fn with_cache(mut self, cache: Arc<RuleModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set cache configuration; ignored when a shared cache is supplied
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.config.cache = config;
        self
    }

    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.config.resolver = config;
        self
    }

    pub fn with_evaluation_config(mut self, config: EvaluationConfig) -> Self {
        self.config.evaluation = config;
        self
    }

    /// Enable or disable the `sys.*` properties
    pub fn enable_system_properties(mut self, enable: bool) -> Self {
        self.config.system_properties = enable;
        self
    }

    /// Register a function for every request; request functions shadow it
    pub fn with_custom_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.register(name, function);
        self
    }

    /// Add a handler that runs before the default handlers
    pub fn add_before_default_handler(mut self, handler: PropertyHandlerRef) -> Self {
        self.before_default_handlers.push(handler);
        self
    }

    /// Add a handler that runs after the default handlers
    pub fn add_after_default_handler(mut self, handler: PropertyHandlerRef) -> Self {
        self.after_default_handlers.push(handler);
        self
    }

    /// Build the decision engine
    ///
    /// Opens the configured repository unless one was supplied directly.
    pub async fn build(self) -> Result<DecisionEngine> {
        let repository = match self.repository {
            Some(repository) => repository,
            None => open_repository(&self.config.repository)
                .await
                .map_err(|e| match e {
                    RepositoryError::Config(message) => SdkError::Config(message),
                    other => SdkError::Repository(other),
                })?,
        };

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(RuleModelCache::new(self.config.cache.clone())));

        let mut handlers = self.before_default_handlers;
        if self.config.system_properties {
            handlers.push(Arc::new(SystemPropertyHandler));
        }
        handlers.extend(self.after_default_handlers);

        let resolver = DecisionResolver::new(repository, cache, self.config.resolver.clone());
        let executor = RuleEngineExecutor::new(self.config.evaluation.clone());

        tracing::info!(
            "Decision engine ready: {} property handler(s), {} custom function(s)",
            handlers.len(),
            self.functions.len()
        );

        Ok(DecisionEngine::new(
            self.config,
            resolver,
            executor,
            self.functions,
            handlers,
        ))
    }
}

impl Default for DecisionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
