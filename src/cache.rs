//! Bounded result caches with pluggable eviction.
//!
//! Entries leave a cache only when inserting past capacity. A capacity of 0
//! disables the cache entirely: nothing is stored and every lookup misses.
//!
//! ```rust
//! use strata::cache::{LruEviction, ResultCache};
//!
//! let mut cache = ResultCache::with_policy(2, LruEviction::default());
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");           // "a" is now most recent
//! cache.insert("c", 3);      // evicts "b"
//! assert!(cache.get(&"b").is_none());
//! assert_eq!(cache.get(&"a"), Some(1));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use lru::LruCache;
use serde::Serialize;

/// Bytes of content hashed into a cache key.
pub const KEY_PREFIX_LEN: usize = 1024;

/// Hash of the first [`KEY_PREFIX_LEN`] bytes of `content` and its total length.
///
/// Documents that share a prefix and a length share a key.
#[must_use]
pub fn content_hash(content: &str) -> u64 {
    let prefix = &content[..crate::sentence::floor_char_boundary(content, KEY_PREFIX_LEN)];
    let mut hasher = DefaultHasher::new();
    prefix.hash(&mut hasher);
    content.len().hash(&mut hasher);
    hasher.finish()
}

/// Decides which key leaves a full cache.
pub trait EvictionPolicy<K>: Send {
    /// A new key was stored.
    fn on_insert(&mut self, key: &K);
    /// An existing key was read or overwritten.
    fn on_access(&mut self, key: &K);
    /// Pick and forget the next victim.
    fn evict(&mut self) -> Option<K>;
    /// Forget everything.
    fn clear(&mut self);
}

/// Evict in insertion order. Reads do not refresh entries.
#[derive(Debug, Clone)]
pub struct FifoEviction<K> {
    queue: VecDeque<K>,
}

impl<K> Default for FifoEviction<K> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<K: Clone + Send> EvictionPolicy<K> for FifoEviction<K> {
    fn on_insert(&mut self, key: &K) {
        self.queue.push_back(key.clone());
    }

    fn on_access(&mut self, _key: &K) {}

    fn evict(&mut self) -> Option<K> {
        self.queue.pop_front()
    }

    fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Evict the least recently used key.
#[derive(Debug)]
pub struct LruEviction<K: Hash + Eq> {
    order: LruCache<K, ()>,
}

impl<K: Hash + Eq> Default for LruEviction<K> {
    fn default() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl<K: Hash + Eq + Clone + Send> EvictionPolicy<K> for LruEviction<K> {
    fn on_insert(&mut self, key: &K) {
        self.order.put(key.clone(), ());
    }

    fn on_access(&mut self, key: &K) {
        self.order.promote(key);
    }

    fn evict(&mut self) -> Option<K> {
        self.order.pop_lru().map(|(key, ())| key)
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

/// Counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Entries currently stored.
    pub len: usize,
    /// Maximum entries.
    pub capacity: usize,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or 0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A bounded map from keys to cloned results.
pub struct ResultCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    policy: Box<dyn EvictionPolicy<K>>,
    hits: u64,
    misses: u64,
}

impl<K, V> std::fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("capacity", &self.capacity)
            .field("len", &self.entries.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone + Send + 'static, V: Clone> ResultCache<K, V> {
    /// A FIFO cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, FifoEviction::default())
    }

    /// A cache with a custom eviction policy.
    #[must_use]
    pub fn with_policy(capacity: usize, policy: impl EvictionPolicy<K> + 'static) -> Self {
        Self::with_boxed_policy(capacity, Box::new(policy))
    }

    /// A cache with an already boxed policy.
    #[must_use]
    pub fn with_boxed_policy(capacity: usize, policy: Box<dyn EvictionPolicy<K>>) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(1024)),
            policy,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a result by key.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.entries.get(key) {
            self.hits += 1;
            self.policy.on_access(key);
            Some(value.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    /// Store a result, evicting when full.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            // Last writer wins.
            *slot = value;
            self.policy.on_access(&key);
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.policy.evict() {
                Some(victim) => {
                    self.entries.remove(&victim);
                }
                None => break,
            }
        }
        self.policy.on_insert(&key);
        self.entries.insert(key, value);
    }

    /// Drop every entry and reset counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.policy.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
