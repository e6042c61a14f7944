//! Deployed decision definition metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant id used when a decision is deployed or requested without a tenant
pub const NO_TENANT_ID: &str = "";

/// Map an optional tenant id onto the no-tenant sentinel
pub fn normalize_tenant(tenant_id: Option<&str>) -> &str {
    tenant_id.unwrap_or(NO_TENANT_ID)
}

/// A deployed, versioned decision table
///
/// Definitions are created at deployment time and never mutated. A new
/// version of the same key supersedes older ones for "latest" resolution,
/// but older versions stay resolvable by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionDefinition {
    /// Unique definition id
    pub id: String,

    /// Decision key (stable across versions)
    pub key: String,

    /// Human-readable name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version, increasing per (key, tenant) starting at 1
    pub version: u32,

    /// Deployment the definition was published in
    pub deployment_id: String,

    /// Parent deployment of that deployment, if it was bundled with another artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_deployment_id: Option<String>,

    /// Tenant id, [`NO_TENANT_ID`] when the deployment has no tenant
    #[serde(default)]
    pub tenant_id: String,

    /// Resource the rule model is parsed from
    pub resource_name: String,

    pub deployed_at: DateTime<Utc>,
}

impl DecisionDefinition {
    pub fn has_tenant(&self) -> bool {
        self.tenant_id != NO_TENANT_ID
    }
}
