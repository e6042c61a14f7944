//! Tabula Parser - YAML to AST parser for the Tabula decision engine
//!
//! This crate converts decision table documents (YAML) and expression strings
//! into Tabula AST structures.

pub mod decision_parser;
pub mod error;
pub mod expression_parser;
pub mod yaml_parser;

// Re-export main parser types
pub use decision_parser::DecisionTableParser;
pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
pub use yaml_parser::YamlParser;
