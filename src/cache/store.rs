//! In-memory query cache
//!
//! One entry per [`CacheKey`]. Entries hold the last successful payload as
//! JSON, the last error (if the most recent fetch failed) and a stale flag.
//! Reads never block on other keys; concurrent access goes through DashMap
//! shards.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use super::keys::{CacheKey, KeyFamily};
use super::traits::CacheLayer;
use crate::http::ApiError;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Last successful payload; kept across failed refetches
    pub data: Option<Value>,
    /// Error from the most recent fetch, cleared on success
    pub error: Option<ApiError>,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
    /// Number of completed fetches for this key
    pub fetches: u32,
}

/// Thread-safe response cache keyed by canonical query keys
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Cached and not invalidated since the last successful fetch
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| !e.stale && e.error.is_none() && e.data.is_some())
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.stale)
    }

    pub fn store_success(&self, key: CacheKey, data: Value) {
        let fetches = self.entries.get(&key).map(|e| e.fetches).unwrap_or(0);
        self.entries.insert(
            key,
            CacheEntry {
                data: Some(data),
                error: None,
                stale: false,
                updated_at: Utc::now(),
                fetches: fetches + 1,
            },
        );
    }

    /// Record a failed fetch. Previous data is retained and the entry stays
    /// stale so the next read retries.
    pub fn store_error(&self, key: CacheKey, error: ApiError) {
        let mut entry = self.entries.entry(key).or_insert_with(|| CacheEntry {
            data: None,
            error: None,
            stale: true,
            updated_at: Utc::now(),
            fetches: 0,
        });
        entry.error = Some(error);
        entry.stale = true;
        entry.updated_at = Utc::now();
        entry.fetches += 1;
    }

    pub fn remove(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, e)| e)
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn keys_in(&self, family: KeyFamily) -> Vec<CacheKey> {
        self.keys()
            .into_iter()
            .filter(|k| k.family() == family)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl CacheLayer for QueryCache {
    fn name(&self) -> &str {
        "query-cache"
    }

    fn is_populated(&self) -> bool {
        !self.entries.is_empty()
    }

    fn invalidate_matching(&self, predicate: &dyn Fn(&CacheKey) -> bool) -> usize {
        let mut touched = 0;
        for mut entry in self.entries.iter_mut() {
            if predicate(entry.key()) {
                entry.stale = true;
                touched += 1;
            }
        }
        touched
    }

    fn invalidate_key(&self, key: &CacheKey) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }
}
