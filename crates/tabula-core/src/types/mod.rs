//! Type system for Tabula
//!
//! - Runtime values
//! - Declared output column types

pub mod field_type;
pub mod value;

pub use field_type::FieldType;
pub use value::Value;
