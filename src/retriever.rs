//! Retriever — the read-through hook invoked on a cache miss.
//!
//! When a [`Cache`](crate::Cache) has a retriever and `get` misses, the
//! retriever is called with the key and must produce the value along with
//! its cost.  On success the entry is inserted (possibly evicting older
//! entries); on failure nothing is inserted and the error is returned to
//! the caller of `get` unchanged.
//!
//! # Example
//! ```
//! use lungo::CacheBuilder;
//!
//! let mut cache: lungo::Cache<u64, String> = CacheBuilder::new(100)
//!     .retriever(|key: &u64| Ok((key.to_string(), 1)))
//!     .build();
//!
//! assert_eq!(*cache.get(&7).unwrap(), "7");
//! ```

use crate::error::BoxError;

/// Produces a missing entry from its key.
///
/// Runs synchronously inside [`Cache::get`](crate::Cache::get), on the
/// calling thread.  If retrieval performs expensive I/O, that I/O blocks the
/// caller (and, when the cache sits behind a lock, every other cache user).
///
/// The returned cost must be non-negative; a negative cost is treated as a
/// caller bug and panics inside `get`.
pub trait Retriever<K, V>: Send + Sync + 'static {
    fn retrieve(&self, key: &K) -> Result<(V, i64), BoxError>;
}

/// A [`Retriever`] backed by a closure.
///
/// Created via [`CacheBuilder::retriever`](crate::CacheBuilder::retriever).
pub struct FnRetriever<F>(pub F);

impl<K, V, F> Retriever<K, V> for FnRetriever<F>
where
    F: Fn(&K) -> Result<(V, i64), BoxError> + Send + Sync + 'static,
{
    fn retrieve(&self, key: &K) -> Result<(V, i64), BoxError> {
        (self.0)(key)
    }
}
