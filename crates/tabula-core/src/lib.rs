//! Tabula Core - Core types and definitions for the Tabula decision engine
//!
//! This crate provides the fundamental types used across the Tabula crates:
//! - Value types for runtime data
//! - Decision table AST (rule models, expressions, hit policies)
//! - Deployed decision definition metadata
//! - Error types

pub mod ast;
pub mod definition;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use ast::{
    Aggregation, DecisionRule, Expression, HitPolicy, InputClause, Operator, OutputClause,
    RuleModel, UnaryOperator,
};
pub use definition::{normalize_tenant, DecisionDefinition, NO_TENANT_ID};
pub use error::CoreError;
pub use types::{FieldType, Value};
