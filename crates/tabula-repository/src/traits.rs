//! Core trait definitions for decision repositories
//!
//! [`DecisionRepository`] is the read-only lookup interface the resolver
//! consults. Implementations are read-mostly and synchronize internally.

use async_trait::async_trait;
use tabula_core::{DecisionDefinition, RuleModel};

use crate::RepositoryResult;

/// Lookup interface over deployed decision definitions
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Latest (highest version) definition for a key within a tenant
    ///
    /// `tenant_id` is already normalized; [`tabula_core::NO_TENANT_ID`] selects
    /// definitions deployed without a tenant.
    async fn find_latest(
        &self,
        key: &str,
        tenant_id: &str,
    ) -> RepositoryResult<Option<DecisionDefinition>>;

    /// Latest definition for a key deployed as part of a parent deployment
    ///
    /// A definition belongs to the parent when its deployment's parent id is
    /// `parent_deployment_id`, or its own deployment id is. When `tenant_id`
    /// is `None` the tenant is not filtered.
    async fn find_by_parent_deployment(
        &self,
        key: &str,
        parent_deployment_id: &str,
        tenant_id: Option<&str>,
    ) -> RepositoryResult<Option<DecisionDefinition>>;

    /// Exact definition by id
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<DecisionDefinition>>;

    /// Load and parse the rule model of a definition
    ///
    /// Called on cache misses only; every call performs a fresh parse.
    async fn load_rule_model(&self, definition_id: &str) -> RepositoryResult<RuleModel>;
}
