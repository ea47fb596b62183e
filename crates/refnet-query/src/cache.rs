// Node cache.
//
// Memoizes `id -> record` and `address -> id` so one traversal never fetches the same
// node twice. The cache is an explicit value handed to each traversal call; its lifetime
// is either the call itself or a caller-owned session.
//
// Records are immutable once fetched, so a repeated `put` for the same id is idempotent.

use lru::LruCache;
use std::num::NonZeroUsize;

use refnet_core::{Address, NodeId, NodeKey, NodeRecord, TraversalConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    /// Unbounded, dropped when the traversal returns.
    PerCall,
    /// Bounded LRU kept across traversals by the caller.
    Session,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct NodeCache {
    records: LruCache<NodeId, NodeRecord>,
    by_address: LruCache<Address, NodeId>,
    lifetime: CacheLifetime,
    stats: CacheStats,
}

impl NodeCache {
    pub fn per_call() -> Self {
        Self {
            records: LruCache::unbounded(),
            by_address: LruCache::unbounded(),
            lifetime: CacheLifetime::PerCall,
            stats: CacheStats::default(),
        }
    }

    pub fn session(capacity: NonZeroUsize) -> Self {
        Self {
            records: LruCache::new(capacity),
            by_address: LruCache::new(capacity),
            lifetime: CacheLifetime::Session,
            stats: CacheStats::default(),
        }
    }

    /// Picks the lifetime from `session_cache_capacity`.
    pub fn from_config(config: &TraversalConfig) -> Self {
        match config.session_cache_capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::session(capacity),
            None => Self::per_call(),
        }
    }

    pub fn get(&mut self, id: NodeId) -> Option<NodeRecord> {
        let found = self.records.get(&id).cloned();
        self.record_lookup(found.is_some());
        found
    }

    pub fn get_by_address(&mut self, address: &Address) -> Option<NodeRecord> {
        let found = match self.by_address.get(address).copied() {
            Some(id) => self.records.get(&id).cloned(),
            None => None,
        };
        self.record_lookup(found.is_some());
        found
    }

    pub fn get_key(&mut self, key: &NodeKey) -> Option<NodeRecord> {
        match key {
            NodeKey::Id(id) => self.get(*id),
            NodeKey::Address(address) => self.get_by_address(address),
        }
    }

    /// Indexes `record` under both its id and its address.
    pub fn put(&mut self, record: NodeRecord) {
        self.by_address.put(record.address.clone(), record.id);
        self.records.put(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lifetime(&self) -> CacheLifetime {
        self.lifetime
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::per_call()
    }
}
