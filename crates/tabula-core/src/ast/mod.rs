//! Abstract Syntax Tree (AST) definitions for Tabula
//!
//! This module contains the AST node definitions for:
//! - Expressions and operators
//! - Decision tables (rule models, rules, clauses, hit policies)

pub mod decision;
pub mod expression;
pub mod operator;

pub use decision::{
    Aggregation, ConditionEntry, DecisionRule, HitPolicy, InputClause, OutputClause, OutputEntry,
    RuleModel,
};
pub use expression::{Expression, UnaryOperator};
pub use operator::Operator;
