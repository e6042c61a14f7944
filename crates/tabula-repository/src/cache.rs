//! Bounded read-through cache of parsed rule models
//!
//! Entries are keyed by definition id. Each entry is a `OnceCell`, so
//! concurrent first lookups of the same id run exactly one load while the
//! other callers wait for its result. A failed load leaves the cell empty and
//! the next lookup retries. Rule models are immutable per id, so reloading an
//! evicted entry is always safe.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tabula_core::RuleModel;
use tokio::sync::{Mutex, OnceCell};

use crate::error::RepositoryResult;
use crate::models::{CacheConfig, CacheStats};
use crate::traits::DecisionRepository;

type Slot = Arc<OnceCell<Arc<RuleModel>>>;

#[derive(Default)]
struct Entries {
    slots: HashMap<String, Slot>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Shared rule model cache
pub struct RuleModelCache {
    config: CacheConfig,
    entries: Mutex<Entries>,
    counters: Counters,
}

impl Default for RuleModelCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl RuleModelCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(Entries::default()),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached model for `definition_id`, loading it from
    /// `repository` on a miss
    ///
    /// With caching disabled every call loads.
    pub async fn get_or_load(
        &self,
        repository: &dyn DecisionRepository,
        definition_id: &str,
    ) -> RepositoryResult<Arc<RuleModel>> {
        if !self.config.enabled {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return self.load(repository, definition_id).await;
        }

        let slot = self.slot(definition_id).await;
        if let Some(model) = slot.get() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Rule model cache hit: {}", definition_id);
            return Ok(Arc::clone(model));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Rule model cache miss: {}", definition_id);

        match slot
            .get_or_try_init(|| self.load(repository, definition_id))
            .await
        {
            Ok(model) => Ok(Arc::clone(model)),
            Err(e) => {
                self.discard_empty(definition_id, &slot).await;
                Err(e)
            }
        }
    }

    /// Peek at a populated entry without loading
    pub async fn get(&self, definition_id: &str) -> Option<Arc<RuleModel>> {
        let entries = self.entries.lock().await;
        entries
            .slots
            .get(definition_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Drop one entry. Returns whether it was present.
    pub async fn invalidate(&self, definition_id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let removed = entries.slots.remove(definition_id).is_some();
        if removed {
            entries.order.retain(|id| id != definition_id);
        }
        removed
    }

    /// Drop all entries
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.slots.clear();
        entries.order.clear();
    }

    /// Snapshot of cache statistics
    pub async fn stats(&self) -> CacheStats {
        let size = self.entries.lock().await.slots.len();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            size,
        }
    }

    /// Find or create the slot for an id, evicting the oldest entries when
    /// the cache is over capacity
    async fn slot(&self, definition_id: &str) -> Slot {
        let mut entries = self.entries.lock().await;
        if let Some(slot) = entries.slots.get(definition_id) {
            return Arc::clone(slot);
        }

        let capacity = self.config.max_entries.max(1);
        while entries.slots.len() >= capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            if entries.slots.remove(&oldest).is_some() {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Evicted rule model: {}", oldest);
            }
        }

        let slot: Slot = Arc::new(OnceCell::new());
        entries
            .slots
            .insert(definition_id.to_string(), Arc::clone(&slot));
        entries.order.push_back(definition_id.to_string());
        slot
    }

    /// Remove `slot` if it is still the entry for `definition_id` and was
    /// never populated
    async fn discard_empty(&self, definition_id: &str, slot: &Slot) {
        let mut entries = self.entries.lock().await;
        let current = entries
            .slots
            .get(definition_id)
            .is_some_and(|s| Arc::ptr_eq(s, slot) && !s.initialized());
        if current {
            entries.slots.remove(definition_id);
            entries.order.retain(|id| id != definition_id);
        }
    }

    async fn load(
        &self,
        repository: &dyn DecisionRepository,
        definition_id: &str,
    ) -> RepositoryResult<Arc<RuleModel>> {
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        match repository.load_rule_model(definition_id).await {
            Ok(model) => {
                tracing::debug!("Loaded rule model for definition {}", definition_id);
                Ok(Arc::new(model))
            }
            Err(e) => {
                self.counters.load_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed to load rule model for {}: {}", definition_id, e);
                Err(e)
            }
        }
    }
}
