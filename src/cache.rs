use std::fmt;
use std::sync::{Arc, Weak};

use moka::sync::Cache;
use tracing::debug;

use crate::resolver::SchemaSource;

/// Cache configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries kept
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

/// Lookup key: the exact (target namespace, location, base URI) triple a
/// resolver was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub target_namespace: String,
    pub location: String,
    pub base_uri: Option<String>,
}

impl CacheKey {
    pub fn new(target_namespace: &str, location: &str, base_uri: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.to_string(),
            location: location.to_string(),
            base_uri: base_uri.map(str::to_string),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (base: {})",
            self.target_namespace,
            self.location,
            self.base_uri.as_deref().unwrap_or("-")
        )
    }
}

/// Resolution cache for one logical thread of work.
///
/// Values are held weakly: an entry only answers while some schema built from
/// that document is still alive, so a lookup may miss for a key that was
/// inserted earlier. Nothing is ever evicted on its own beyond the capacity
/// bound; owners call [`clear`](Self::clear) when done.
///
/// Clones share the same storage. Independent threads should each create
/// their own cache.
#[derive(Clone)]
pub struct ResolutionCache {
    cache: Cache<CacheKey, Weak<SchemaSource>>,
}

impl ResolutionCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder().max_capacity(config.max_entries).build();

        Self { cache }
    }

    /// Get a live document, dropping the entry if it has been reclaimed.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<SchemaSource>> {
        let weak = self.cache.get(key)?;
        match weak.upgrade() {
            Some(source) => {
                debug!(%key, "resolution cache hit");
                Some(source)
            }
            None => {
                debug!(%key, "resolution cache entry reclaimed");
                self.cache.invalidate(key);
                None
            }
        }
    }

    /// Insert a document. Concurrent inserts under one key: last writer wins.
    pub fn insert(&self, key: CacheKey, source: &Arc<SchemaSource>) {
        self.cache.insert(key, Arc::downgrade(source));
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache
            .get(key)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn remove(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        // Run pending tasks so the counts reflect all completed writes
        self.cache.run_pending_tasks();

        let live_entries = self
            .cache
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count() as u64;

        CacheStats {
            entry_count: self.cache.entry_count(),
            live_entries,
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

/// Statistics for cache operations
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    /// Stored entries, including reclaimed ones not yet dropped
    pub entry_count: u64,
    /// Entries whose document is still alive
    pub live_entries: u64,
}
