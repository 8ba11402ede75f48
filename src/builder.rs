use std::hash::Hash;
use std::sync::Arc;

use crate::cache::Cache;
use crate::error::BoxError;
use crate::listener::{EvictionCause, EvictionListener, FnListener};
use crate::retriever::{FnRetriever, Retriever};

/// Builder for configuring and constructing a [`Cache`].
///
/// # Example
/// ```
/// use lungo::CacheBuilder;
///
/// let mut cache: lungo::Cache<String, Vec<u8>> = CacheBuilder::new(1 << 20)
///     .retriever(|key: &String| {
///         let bytes = key.clone().into_bytes();
///         let cost = bytes.len() as i64;
///         Ok((bytes, cost))
///     })
///     .build();
///
/// assert_eq!(*cache.get(&"espresso".to_string()).unwrap(), b"espresso");
/// ```
pub struct CacheBuilder<K, V> {
    max_cost: i64,
    retriever: Option<Box<dyn Retriever<K, V>>>,
    listener: Option<Box<dyn EvictionListener<K, V>>>,
}

impl<K, V> CacheBuilder<K, V> {
    /// Starts a builder for a cache bounded by `max_cost`.
    ///
    /// # Panics
    /// Panics if `max_cost` is negative.
    pub fn new(max_cost: i64) -> Self {
        assert!(max_cost >= 0, "max_cost must be non-negative, got {max_cost}");
        CacheBuilder {
            max_cost,
            retriever: None,
            listener: None,
        }
    }

    /// Register a read-through retriever closure, called on every miss with
    /// the requested key.  It returns the value and its cost, or an error
    /// that `get` hands back to the caller unchanged.
    pub fn retriever<F>(mut self, f: F) -> Self
    where
        F: Fn(&K) -> Result<(V, i64), BoxError> + Send + Sync + 'static,
    {
        self.retriever = Some(Box::new(FnRetriever(f)));
        self
    }

    /// Register a retriever via the [`Retriever`] trait.
    pub fn retriever_impl<R: Retriever<K, V>>(mut self, retriever: R) -> Self {
        self.retriever = Some(Box::new(retriever));
        self
    }

    /// Register an eviction listener closure.
    ///
    /// The closure is called synchronously each time an entry is removed,
    /// whether by capacity pressure or an explicit eviction, after the
    /// entry has left the cache's internal structures.
    pub fn eviction_listener<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(FnListener(f)));
        self
    }

    /// Register an eviction listener via the [`EvictionListener`] trait.
    pub fn eviction_listener_impl<L: EvictionListener<K, V>>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
{
    pub fn build(self) -> Cache<K, V> {
        Cache::with_hooks(self.max_cost, self.retriever, self.listener)
    }
}
