//! Data models for the repository layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups served from an already populated entry
    pub hits: u64,
    /// Number of lookups that found no populated entry
    pub misses: u64,
    /// Number of rule model loads actually performed
    pub loads: u64,
    /// Number of loads that failed (entry left unpopulated)
    pub load_failures: u64,
    /// Number of entries evicted to stay within bounds
    pub evictions: u64,
    /// Number of entries in cache
    pub size: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Rule model cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Maximum number of entries to keep in cache
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable caching
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the maximum number of entries
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

/// A published deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    /// Artifact this deployment was published together with
    pub parent_deployment_id: Option<String>,
    pub tenant_id: String,
    pub deployed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_cache_config_builders() {
        let config = CacheConfig::new().with_max_entries(10);
        assert!(config.enabled);
        assert_eq!(config.max_entries, 10);
        assert!(!CacheConfig::disabled().enabled);
    }
}
