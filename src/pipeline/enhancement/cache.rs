//! Per-service cache of enhancement records.
//!
//! Keyed by `{term}_{type}`. Entries are shared as `Arc` so a cached record
//! handed to one analysis is never mutated by another. With a TTL set,
//! stale entries are dropped on read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::EnhancementRecord;

struct CacheEntry {
    record: Arc<EnhancementRecord>,
    inserted_at: Instant,
}

pub struct EnhancementCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Option<Duration>,
    hits: u64,
    misses: u64,
}

impl EnhancementCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a record, counting the hit or miss.
    pub fn get(&mut self, key: &str) -> Option<Arc<EnhancementRecord>> {
        let expired = match (self.entries.get(key), self.ttl) {
            (Some(entry), Some(ttl)) => entry.inserted_at.elapsed() >= ttl,
            _ => false,
        };
        if expired {
            self.entries.remove(key);
            tracing::debug!(key, "Cache entry expired");
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry.record.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or replace a record.
    pub fn set(&mut self, key: String, record: Arc<EnhancementRecord>) {
        self.entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for EnhancementCache {
    fn default() -> Self {
        Self::new(None)
    }
}
