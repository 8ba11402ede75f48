//! Eviction listener — a callback invoked whenever an entry leaves the cache.
//!
//! # Example
//! ```
//! use lungo::listener::EvictionCause;
//! use lungo::CacheBuilder;
//!
//! let mut cache: lungo::Cache<u64, u64> = CacheBuilder::new(2)
//!     .eviction_listener(|key: &u64, _val, cause| {
//!         println!("evicted key={key} cause={cause:?}");
//!     })
//!     .build();
//!
//! cache.put(1, 1, 10);
//! cache.put(2, 1, 20);
//! cache.put(3, 1, 30); // capacity eviction of key 1
//! cache.evict(&2); // explicit removal
//! ```

use std::sync::Arc;

// ---------------------------------------------------------------------------
// EvictionCause
// ---------------------------------------------------------------------------

/// The reason an entry was removed from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionCause {
    /// Removed because the cache exceeded its maximum cost and this entry
    /// was the least recently used.
    Capacity,
    /// Removed explicitly via [`Cache::evict`], [`Cache::evict_oldest`], or
    /// [`Cache::clear`].
    ///
    /// [`Cache::evict`]: crate::Cache::evict
    /// [`Cache::evict_oldest`]: crate::Cache::evict_oldest
    /// [`Cache::clear`]: crate::Cache::clear
    Explicit,
}

// ---------------------------------------------------------------------------
// EvictionListener trait
// ---------------------------------------------------------------------------

/// A callback invoked each time an entry is evicted.
///
/// The callback receives:
/// - a reference to the evicted key,
/// - a shared reference to the evicted value (`Arc<V>`),
/// - the reason for removal.
///
/// It runs synchronously, once per evicted entry, after the entry has been
/// removed from the cache's internal structures.  The cache does not manage
/// the lifecycle of stored values; releasing resources held by an evicted
/// value is the listener's job.  The listener has no way to report failure
/// to the cache — handle errors inside the callback.
pub trait EvictionListener<K, V>: Send + Sync + 'static {
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause);
}

/// An [`EvictionListener`] backed by a closure.
///
/// Created via
/// [`CacheBuilder::eviction_listener`](crate::CacheBuilder::eviction_listener).
pub struct FnListener<F>(pub F);

impl<K, V, F> EvictionListener<K, V> for FnListener<F>
where
    F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
{
    fn on_evict(&self, key: &K, value: Arc<V>, cause: EvictionCause) {
        (self.0)(key, value, cause)
    }
}
