//! Error types for Tabula Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown hit policy: {0}")]
    UnknownHitPolicy(String),

    #[error("Unknown aggregation: {0}")]
    UnknownAggregation(String),

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
