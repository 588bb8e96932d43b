// 🗃️ Lookup Caches - explicit get/put stores owned by the caller
//
// Three caches sit in front of the registry: identifier resolution,
// entity profiles and holder lists. Entries are never expired; negative
// answers (None / empty list) are cached too, provider errors are not.
//
// Caches are shared between resolutions (Arc), visited-sets and edge
// collections never are.

use crate::entities::{EntityProfile, HolderRow};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

// ============================================================================
// CACHE CONTRACT
// ============================================================================

pub trait LookupCache<K, V>: Send + Sync {
    /// Cached value for `key`, if present
    fn get(&self, key: &K) -> Option<V>;

    /// Store `value` under `key`, replacing any previous entry
    fn put(&self, key: K, value: V);

    /// Number of cached entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// IN-MEMORY CACHE
// ============================================================================

/// Unbounded in-memory cache, cheap to clone (clones share storage).
pub struct MemoryCache<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> MemoryCache<K, V> {
    pub fn new() -> Self {
        MemoryCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Clone for MemoryCache<K, V> {
    fn clone(&self) -> Self {
        MemoryCache {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LookupCache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, value);
    }

    fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }
}

// ============================================================================
// PROVIDER CACHES
// ============================================================================

pub type IdentifierCache = Arc<dyn LookupCache<String, Option<String>>>;
pub type ProfileCache = Arc<dyn LookupCache<String, Option<EntityProfile>>>;
pub type HolderCache = Arc<dyn LookupCache<String, Vec<HolderRow>>>;

/// The three registry caches, bundled so a caller can hand one set to
/// many resolvers.
#[derive(Clone)]
pub struct ProviderCaches {
    /// name-or-id → canonical id (None = not found)
    pub identifiers: IdentifierCache,

    /// id → profile (None = no profile data)
    pub profiles: ProfileCache,

    /// id → holder list
    pub holders: HolderCache,
}

impl ProviderCaches {
    /// Fresh in-memory caches
    pub fn in_memory() -> Self {
        ProviderCaches {
            identifiers: Arc::new(MemoryCache::<String, Option<String>>::new()),
            profiles: Arc::new(MemoryCache::<String, Option<EntityProfile>>::new()),
            holders: Arc::new(MemoryCache::<String, Vec<HolderRow>>::new()),
        }
    }

    pub fn new(identifiers: IdentifierCache, profiles: ProfileCache, holders: HolderCache) -> Self {
        ProviderCaches {
            identifiers,
            profiles,
            holders,
        }
    }
}

impl Default for ProviderCaches {
    fn default() -> Self {
        Self::in_memory()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_get_put() {
        let cache: MemoryCache<String, Option<String>> = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"甲公司".to_string()), None);

        cache.put("甲公司".to_string(), Some("12345678".to_string()));
        cache.put("Foreign Co".to_string(), None);

        assert_eq!(
            cache.get(&"甲公司".to_string()),
            Some(Some("12345678".to_string()))
        );
        // negative answers are cached
        assert_eq!(cache.get(&"Foreign Co".to_string()), Some(None));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_memory_cache_clones_share_storage() {
        let cache: MemoryCache<String, Vec<HolderRow>> = MemoryCache::new();
        let other = cache.clone();

        other.put("12345678".to_string(), Vec::new());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"12345678".to_string()), Some(Vec::new()));
    }
}
