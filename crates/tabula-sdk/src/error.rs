//! SDK error types

use tabula_repository::RepositoryError;
use tabula_runtime::{AuditError, EvaluationError};
use thiserror::Error;

use crate::phase::PhaseTransitionError;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Request or argument rejected before any lookup was made
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No definition satisfies the request
    #[error("Decision not found: {0}")]
    NotFound(String),

    /// Rule evaluation failed
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// The rule model of a resolved definition could not be loaded
    #[error("Failed to load rule model for '{definition_id}': {source}")]
    CacheLoad {
        definition_id: String,
        #[source]
        source: RepositoryError,
    },

    /// Repository lookup failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A single result was requested but several rules fired
    #[error("Decision '{key}' produced {count} results, expected at most one")]
    MultipleResults { key: String, count: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Execution phase machine misuse
    #[error(transparent)]
    Phase(#[from] PhaseTransitionError),
}

impl From<AuditError> for SdkError {
    fn from(error: AuditError) -> Self {
        SdkError::InvalidArgument(format!("audit trail: {}", error))
    }
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
