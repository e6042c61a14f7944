//! Error types for the repository layer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No definition with this id exists
    #[error("Decision definition not found: {id}")]
    DefinitionNotFound { id: String },

    /// Resource file missing on disk
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Deployment descriptor could not be parsed
    #[error("Failed to parse deployment descriptor: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Decision table resource could not be parsed
    #[error("Failed to parse resource '{resource}': {source}")]
    Parse {
        resource: String,
        #[source]
        source: tabula_parser::ParseError,
    },

    /// Invalid path provided
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Deployment rejected
    #[error("Invalid deployment: {0}")]
    InvalidDeployment(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
