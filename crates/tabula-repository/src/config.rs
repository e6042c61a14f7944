//! Repository configuration types
//!
//! Selects which backend the engine reads decision definitions from.

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};

/// Repository source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySource {
    /// Deployment directories on disk
    FileSystem,
    /// In-process repository populated through `deploy`
    #[default]
    Memory,
}

/// Repository configuration
///
/// # Examples
///
/// ```rust
/// use tabula_repository::RepositoryConfig;
///
/// let config = RepositoryConfig::file_system("deployments");
/// assert!(config.validate().is_ok());
///
/// let config = RepositoryConfig::memory();
/// assert!(config.base_path.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Configuration source type
    pub source: RepositorySource,

    /// Root directory holding deployment directories (required for FileSystem source)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

impl RepositoryConfig {
    /// Create a file system repository configuration
    pub fn file_system(path: impl Into<String>) -> Self {
        Self {
            source: RepositorySource::FileSystem,
            base_path: Some(path.into()),
        }
    }

    /// Create a memory repository configuration
    pub fn memory() -> Self {
        Self {
            source: RepositorySource::Memory,
            base_path: None,
        }
    }

    /// Validate the configuration
    ///
    /// Returns an error if required fields are missing for the selected source.
    pub fn validate(&self) -> RepositoryResult<()> {
        match self.source {
            RepositorySource::FileSystem => match self.base_path.as_deref() {
                Some(path) if !path.trim().is_empty() => Ok(()),
                _ => Err(RepositoryError::Config(
                    "file_system source requires base_path to be set".to_string(),
                )),
            },
            RepositorySource::Memory => Ok(()),
        }
    }
}
