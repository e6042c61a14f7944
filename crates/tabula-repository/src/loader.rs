//! Repository construction from configuration

use std::sync::Arc;

use crate::config::{RepositoryConfig, RepositorySource};
use crate::error::{RepositoryError, RepositoryResult};
use crate::file_system::FileSystemDecisionRepository;
use crate::memory::InMemoryDecisionRepository;
use crate::traits::DecisionRepository;

/// Open the repository described by `config`
///
/// A memory source yields an empty repository. Embedders that deploy
/// programmatically should construct [`InMemoryDecisionRepository`] directly
/// and keep a handle to it.
pub async fn open_repository(
    config: &RepositoryConfig,
) -> RepositoryResult<Arc<dyn DecisionRepository>> {
    config.validate()?;

    match config.source {
        RepositorySource::FileSystem => {
            let base_path = config.base_path.as_deref().ok_or_else(|| {
                RepositoryError::Config("base_path required for file_system source".to_string())
            })?;
            let repo = FileSystemDecisionRepository::open(base_path).await?;
            Ok(Arc::new(repo))
        }
        RepositorySource::Memory => Ok(Arc::new(InMemoryDecisionRepository::new())),
    }
}
