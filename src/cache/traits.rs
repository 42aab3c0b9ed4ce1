//! Unified cache trait for coordinated invalidation
//!
//! Every cache layer that holds server responses implements this trait so
//! mutation events can mark entries stale consistently.

use super::keys::CacheKey;

/// Common interface for cache layers
///
/// Invalidation marks entries stale; the next read of a stale key goes back
/// to the network. Entries are never dropped by invalidation alone.
pub trait CacheLayer: Send + Sync {
    /// Name of this cache layer (for logging)
    fn name(&self) -> &str;

    /// Check if this cache has any data
    fn is_populated(&self) -> bool;

    /// Mark every entry whose key satisfies `predicate` as stale.
    /// Returns the number of entries touched.
    fn invalidate_matching(&self, predicate: &dyn Fn(&CacheKey) -> bool) -> usize;

    /// Mark one exact key stale. Returns whether the key was cached.
    fn invalidate_key(&self, key: &CacheKey) -> bool;

    /// Invalidate all cached data
    fn invalidate_all(&self) -> usize {
        self.invalidate_matching(&|_| true)
    }
}
