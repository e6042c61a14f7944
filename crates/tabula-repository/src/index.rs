//! In-memory index over deployed definitions shared by repository backends

use tabula_core::DecisionDefinition;

/// Definitions in deployment order
#[derive(Debug, Default, Clone)]
pub(crate) struct DefinitionIndex {
    definitions: Vec<DecisionDefinition>,
}

impl DefinitionIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }

    pub(crate) fn insert(&mut self, definition: DecisionDefinition) {
        self.definitions.push(definition);
    }

    /// Version the next deployment of `key` within `tenant_id` receives
    pub(crate) fn next_version(&self, key: &str, tenant_id: &str) -> u32 {
        self.definitions
            .iter()
            .filter(|d| d.key == key && d.tenant_id == tenant_id)
            .map(|d| d.version)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<&DecisionDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub(crate) fn latest(&self, key: &str, tenant_id: &str) -> Option<&DecisionDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.key == key && d.tenant_id == tenant_id)
            .max_by_key(|d| d.version)
    }

    pub(crate) fn latest_for_parent(
        &self,
        key: &str,
        parent_deployment_id: &str,
        tenant_id: Option<&str>,
    ) -> Option<&DecisionDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.key == key)
            .filter(|d| {
                d.parent_deployment_id.as_deref() == Some(parent_deployment_id)
                    || d.deployment_id == parent_deployment_id
            })
            .filter(|d| tenant_id.map_or(true, |t| d.tenant_id == t))
            .max_by_key(|d| d.version)
    }
}
