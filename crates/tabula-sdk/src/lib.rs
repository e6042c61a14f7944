//! Tabula SDK
//!
//! High-level API for resolving and executing decision tables.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tabula_sdk::{DecisionEngineBuilder, DecisionRequest, InMemoryDecisionRepository, NewDeployment};
//!
//! const DISCOUNT: &str = r#"
//! decision:
//!   key: discount
//!   hit_policy: first
//!   rules:
//!     - id: big_order
//!       when: total > 100
//!       then:
//!         discount: 0.1
//!     - id: default
//!       then:
//!         discount: 0
//! "#;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repository = Arc::new(InMemoryDecisionRepository::new());
//!     repository
//!         .deploy(NewDeployment::new("pricing").with_yaml("discount.yaml", DISCOUNT))
//!         .await?;
//!
//!     let engine = DecisionEngineBuilder::new()
//!         .with_repository(repository)
//!         .build()
//!         .await?;
//!
//!     let request = DecisionRequest::builder("discount")
//!         .with_variable("total", 250.0)
//!         .build();
//!     let audit = engine.execute_decision(&request).await?;
//!
//!     assert_eq!(audit.fired_rule_ids(), vec!["big_order"]);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod phase;
pub mod request;
pub mod resolver;

pub use builder::DecisionEngineBuilder;
pub use config::EngineConfig;
pub use engine::DecisionEngine;
pub use error::{Result, SdkError};
pub use phase::{ExecutionPhase, ExecutionTracker, PhaseTransitionError};
pub use request::{DecisionRequest, ExecuteDecisionBuilder};
pub use resolver::{DecisionResolver, ResolutionStrategy, ResolvedDecision, ResolverConfig};

// Re-export commonly used types
pub use tabula_core::{DecisionDefinition, HitPolicy, RuleModel, Value, NO_TENANT_ID};
pub use tabula_repository::{
    CacheConfig, CacheStats, DecisionRepository, FileSystemDecisionRepository, InMemoryDecisionRepository,
    NewDeployment, RepositoryConfig, RepositorySource, RuleModelCache,
};
pub use tabula_runtime::{
    AuditContainer, EvaluationConfig, EvaluationError, FiringRecord, FnPropertyHandler, FunctionRegistry,
    PropertyHandler, PropertyHandlerRef, RuleTrace, StaticPropertyHandler, SystemPropertyHandler,
};
