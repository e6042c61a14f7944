//! Decision execution

use chrono::Utc;
use std::borrow::Cow;
use std::collections::HashMap;
use tabula_core::Value;
use tabula_repository::CacheStats;
use tabula_runtime::{
    generate_execution_id, AuditContainer, FunctionRegistry, PropertyHandlerRef, RuleEngineExecutor,
};

use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::phase::{ExecutionPhase, ExecutionTracker};
use crate::request::DecisionRequest;
use crate::resolver::DecisionResolver;

/// Resolves and evaluates decisions
///
/// Cheap to share behind an `Arc`; every execution is independent and the
/// only shared mutable state is the rule model cache.
pub struct DecisionEngine {
    config: EngineConfig,
    resolver: DecisionResolver,
    executor: RuleEngineExecutor,
    functions: FunctionRegistry,
    handlers: Vec<PropertyHandlerRef>,
}

impl DecisionEngine {
    pub(crate) fn new(
        config: EngineConfig,
        resolver: DecisionResolver,
        executor: RuleEngineExecutor,
        functions: FunctionRegistry,
        handlers: Vec<PropertyHandlerRef>,
    ) -> Self {
        Self {
            config,
            resolver,
            executor,
            functions,
            handlers,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &DecisionResolver {
        &self.resolver
    }

    /// Names of the engine-wide property handlers, in run order
    pub fn property_handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.resolver.cache().stats().await
    }

    /// Resolve, evaluate and audit one decision
    ///
    /// The request's key is checked before the repository is consulted. Any
    /// failure aborts the execution; there is no partial result.
    pub async fn execute_decision(&self, request: &DecisionRequest) -> Result<AuditContainer> {
        let started_at = Utc::now();
        let mut tracker = ExecutionTracker::new(
            generate_execution_id(),
            request.decision_key().unwrap_or_default(),
        );

        match self.run(request, &mut tracker, started_at).await {
            Ok(audit) => Ok(audit),
            Err(error) => {
                tracker.fail(&error);
                Err(error)
            }
        }
    }

    /// Output map of every firing rule, in firing order
    pub async fn execute(&self, request: &DecisionRequest) -> Result<Vec<HashMap<String, Value>>> {
        Ok(self.execute_decision(request).await?.into_decision_results())
    }

    /// Outputs of the single firing rule, `None` when no rule fired
    pub async fn execute_with_single_result(
        &self,
        request: &DecisionRequest,
    ) -> Result<Option<HashMap<String, Value>>> {
        let mut results = self.execute(request).await?;
        match results.len() {
            0 => Ok(None),
            1 => Ok(results.pop()),
            count => Err(SdkError::MultipleResults {
                key: request.decision_key().unwrap_or_default().to_string(),
                count,
            }),
        }
    }

    async fn run(
        &self,
        request: &DecisionRequest,
        tracker: &mut ExecutionTracker,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<AuditContainer> {
        request.validate()?;

        let resolved = self.resolver.resolve(request).await?;
        tracing::debug!(
            "[{}] Resolved '{}' to {} (v{}, {:?})",
            tracker.execution_id(),
            resolved.definition.key,
            resolved.definition.id,
            resolved.definition.version,
            resolved.strategy
        );

        tracker.advance(ExecutionPhase::Evaluating)?;
        let functions = self.functions_for(request);
        let handlers = self.handlers_for(request);
        let outcome = self.executor.evaluate(
            &resolved.model,
            request.variables(),
            &functions,
            &handlers,
        )?;

        tracker.advance(ExecutionPhase::Auditing)?;
        let audit = self
            .executor
            .audit_builder(
                &resolved.definition,
                &resolved.model,
                request.variables(),
                outcome,
            )
            .execution_id(tracker.execution_id())
            .started_at(started_at)
            .completed_at(Utc::now())
            .build()?;

        tracker.advance(ExecutionPhase::Completed)?;
        tracing::info!(
            "[{}] Decision '{}' v{} completed: {} rule(s) fired in {}ms",
            audit.execution_id(),
            audit.decision().key,
            audit.decision().version,
            audit.firing_records().len(),
            audit.duration_ms()
        );

        Ok(audit)
    }

    /// Engine functions with the request's functions layered on top
    fn functions_for<'a>(&'a self, request: &DecisionRequest) -> Cow<'a, FunctionRegistry> {
        if request.functions().is_empty() {
            return Cow::Borrowed(&self.functions);
        }
        let mut functions = self.functions.clone();
        functions.extend_from(request.functions());
        Cow::Owned(functions)
    }

    /// Engine handlers followed by the request's handlers
    fn handlers_for<'a>(&'a self, request: &DecisionRequest) -> Cow<'a, [PropertyHandlerRef]> {
        if request.property_handlers().is_empty() {
            return Cow::Borrowed(&self.handlers);
        }
        let mut handlers = self.handlers.clone();
        handlers.extend(request.property_handlers().iter().cloned());
        Cow::Owned(handlers)
    }
}
