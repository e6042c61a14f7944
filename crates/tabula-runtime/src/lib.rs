//! Tabula Runtime - Rule evaluation engine
//!
//! This crate evaluates parsed decision tables against caller variables and
//! assembles the audit trail of each execution.
//!
//! ```rust
//! use std::collections::HashMap;
//! use tabula_core::{DecisionRule, Expression, HitPolicy, Operator, RuleModel, Value};
//! use tabula_runtime::{FunctionRegistry, RuleEngineExecutor};
//!
//! let model = RuleModel::new("discount")
//!     .with_hit_policy(HitPolicy::First)
//!     .with_rule(
//!         DecisionRule::new("adults")
//!             .with_condition(
//!                 "age >= 18",
//!                 Expression::binary(
//!                     Expression::variable("age"),
//!                     Operator::Ge,
//!                     Expression::literal(18.0),
//!                 ),
//!             )
//!             .with_output("discount", "0.1", Expression::literal(0.1)),
//!     );
//!
//! let variables = HashMap::from([("age".to_string(), Value::Number(30.0))]);
//! let outcome = RuleEngineExecutor::default()
//!     .evaluate(&model, &variables, &FunctionRegistry::new(), &[])
//!     .unwrap();
//!
//! assert_eq!(outcome.outputs["discount"], Value::Number(0.1));
//! ```

pub mod audit;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod function;
mod operators;
pub mod property;

pub use audit::{
    generate_execution_id, AuditContainer, AuditTrailBuilder, ConditionTrace, DecisionReference,
    FiringRecord, InputTrace, RuleTrace,
};
pub use context::ExecutionContext;
pub use error::{AuditError, EvaluationError, Result};
pub use evaluator::evaluate;
pub use executor::{EvaluationConfig, EvaluationOutcome, RuleEngineExecutor};
pub use function::{CustomFunction, FunctionRegistry, BUILTIN_FUNCTIONS};
pub use property::{
    FnPropertyHandler, PropertyHandler, PropertyHandlerRef, StaticPropertyHandler,
    SystemPropertyHandler,
};
