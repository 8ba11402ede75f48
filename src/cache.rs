use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;

use crate::builder::CacheBuilder;
use crate::error::{BoxError, CacheError};
use crate::listener::{EvictionCause, EvictionListener, FnListener};
use crate::metrics::stats::{Metrics, StatsCounter};
use crate::retriever::{FnRetriever, Retriever};

/// Sentinel indices in the `nodes` arena.
const HEAD: usize = 0; // most-recently-used end
const TAIL: usize = 1; // least-recently-used end
const NULL: usize = usize::MAX;

struct Node<K, V> {
    /// `None` only for the HEAD and TAIL sentinels and freed slots.
    key: Option<K>,
    value: Option<Arc<V>>,
    cost: i64,
    /// Index toward HEAD (more recently used).
    prev: usize,
    /// Index toward TAIL (less recently used).
    next: usize,
}

/// Panics when the running total would pass `i64::MAX`.  Overflowing the
/// cost accounting is a caller bug, not a runtime condition, so it must not
/// come back as a recoverable error.
fn checked_total(base: i64, cost: i64) -> i64 {
    match base.checked_add(cost) {
        Some(total) => total,
        None => panic!("total cache cost overflows i64 (current {base}, adding {cost})"),
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// A cost-bounded LRU cache with optional read-through retrieval.
///
/// Entries carry a non-negative `i64` cost; the cache evicts from the
/// least-recently-used end until the total cost fits under
/// [`max_cost`](Cache::max_cost), always keeping at least one entry (a
/// single entry may therefore exceed the bound on its own).  Recency is
/// tracked with an index-arena doubly-linked list plus a hash index, so
/// `get`, `put`, and `evict` are all O(1); a `put` that must evict `k`
/// entries is O(k).
///
/// The cache is **not** internally synchronized — every method takes
/// `&mut self`.  Share it across threads by wrapping it in a lock of your
/// choosing.  That same exclusive borrow means a retriever or eviction
/// listener can never call back into the cache that invoked it.
///
/// # Example
/// ```
/// use lungo::Cache;
///
/// let mut cache: Cache<&str, u64> = Cache::new(10);
/// cache.put("answer", 1, 42);
/// assert_eq!(*cache.get(&"answer").unwrap(), 42);
/// ```
pub struct Cache<K, V> {
    /// Index 0 = HEAD sentinel, 1 = TAIL sentinel, 2+ = entries.
    nodes: Vec<Node<K, V>>,
    /// Maps a key to its index in `nodes`.
    index: AHashMap<K, usize>,
    /// Indices of freed (reusable) slots.
    free_list: Vec<usize>,
    total_cost: i64,
    max_cost: i64,
    retriever: Option<Box<dyn Retriever<K, V>>>,
    listener: Option<Box<dyn EvictionListener<K, V>>>,
    stats: StatsCounter,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
{
    /// Creates an empty cache with the given maximum total cost.
    ///
    /// A maximum of zero is legal: only zero-cost entries, or the single
    /// over-budget entry the eviction loop always retains, can then stay
    /// resident.
    ///
    /// # Panics
    /// Panics if `max_cost` is negative.
    pub fn new(max_cost: i64) -> Self {
        assert!(max_cost >= 0, "max_cost must be non-negative, got {max_cost}");
        let mut nodes: Vec<Node<K, V>> = Vec::with_capacity(16);
        // HEAD sentinel (index 0): next points to TAIL initially
        nodes.push(Node {
            key: None,
            value: None,
            cost: 0,
            prev: NULL,
            next: TAIL,
        });
        // TAIL sentinel (index 1): prev points to HEAD initially
        nodes.push(Node {
            key: None,
            value: None,
            cost: 0,
            prev: HEAD,
            next: NULL,
        });

        Cache {
            nodes,
            index: AHashMap::new(),
            free_list: Vec::new(),
            total_cost: 0,
            max_cost,
            retriever: None,
            listener: None,
            stats: StatsCounter::new(),
        }
    }

    /// Returns a [`CacheBuilder`] for constructing a cache with hooks.
    pub fn builder(max_cost: i64) -> CacheBuilder<K, V> {
        CacheBuilder::new(max_cost)
    }

    pub(crate) fn with_hooks(
        max_cost: i64,
        retriever: Option<Box<dyn Retriever<K, V>>>,
        listener: Option<Box<dyn EvictionListener<K, V>>>,
    ) -> Self {
        let mut cache = Cache::new(max_cost);
        cache.retriever = retriever;
        cache.listener = listener;
        cache
    }

    // -----------------------------------------------------------------------
    // List mechanics
    // -----------------------------------------------------------------------

    /// Links `idx` immediately after the HEAD sentinel (marks it
    /// most-recently-used).
    fn link_after_head(&mut self, idx: usize) {
        let old_first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = old_first;
        self.nodes[HEAD].next = idx;
        self.nodes[old_first].prev = idx;
    }

    /// Detaches `idx` from its current position in the list.
    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    /// Allocates a new node (reusing from the free list when available).
    fn alloc_node(&mut self, key: K, cost: i64, value: Arc<V>) -> usize {
        if let Some(idx) = self.free_list.pop() {
            let node = &mut self.nodes[idx];
            node.key = Some(key);
            node.value = Some(value);
            node.cost = cost;
            node.prev = NULL;
            node.next = NULL;
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: Some(key),
                value: Some(value),
                cost,
                prev: NULL,
                next: NULL,
            });
            idx
        }
    }

    /// Removes the entry at `idx`, fires the listener, and returns the
    /// value.  The listener runs after the entry is gone from the list,
    /// index, and cost total.
    fn evict_index(&mut self, idx: usize, cause: EvictionCause) -> Option<Arc<V>> {
        self.unlink(idx);
        let key = self.nodes[idx].key.take()?;
        let value = self.nodes[idx].value.take()?;
        let cost = self.nodes[idx].cost;
        self.index.remove(&key);
        self.free_list.push(idx);
        self.total_cost -= cost;
        self.stats.record_eviction();
        if let Some(listener) = &self.listener {
            listener.on_evict(&key, Arc::clone(&value), cause);
        }
        Some(value)
    }

    /// Evicts the entry at the least-recently-used end, if any.
    fn evict_lru(&mut self, cause: EvictionCause) -> Option<Arc<V>> {
        let lru_idx = self.nodes[TAIL].prev;
        if lru_idx == HEAD {
            return None; // list is empty
        }
        self.evict_index(lru_idx, cause)
    }

    /// Drains LRU evictions until `total_cost <= max_cost`, but never below
    /// one resident entry: a sole entry may exceed the bound on its own and
    /// stays until something replaces it.
    fn enforce_capacity(&mut self) {
        while self.total_cost > self.max_cost && self.index.len() > 1 {
            if self.evict_lru(EvictionCause::Capacity).is_none() {
                break;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Get
    // -----------------------------------------------------------------------

    /// Returns the value for `key`, retrieving it on a miss if a retriever
    /// is configured.
    ///
    /// A hit promotes the entry to most-recently-used and has no other side
    /// effect.  A miss with no retriever returns [`CacheError::Miss`] and
    /// leaves the cache untouched.  A miss with a retriever invokes it
    /// synchronously; on success the entry is inserted through the same
    /// path as [`put`](Cache::put) (including eviction of older entries),
    /// on failure the error is returned verbatim and nothing is inserted.
    ///
    /// # Panics
    /// Panics if the retriever returns a negative cost, or if admitting the
    /// retrieved entry would overflow the total cost.
    pub fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        if let Some(&idx) = self.index.get(key) {
            self.unlink(idx);
            self.link_after_head(idx);
            if let Some(value) = self.nodes[idx].value.clone() {
                self.stats.record_hit();
                return Ok(value);
            }
        }

        self.stats.record_miss();
        let (value, cost) = match &self.retriever {
            Some(retriever) => retriever.retrieve(key)?,
            None => return Err(CacheError::Miss),
        };
        self.stats.record_retrieval();

        let value = Arc::new(value);
        self.put_arc(key.clone(), cost, Arc::clone(&value));
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Put
    // -----------------------------------------------------------------------

    /// Inserts `value` for `key` with the given cost, bypassing retrieval.
    ///
    /// If the key already exists its value and cost are replaced in place
    /// and the entry is promoted to most-recently-used; the previous value
    /// is returned.  Afterwards, least-recently-used entries are evicted
    /// until the total cost fits under the maximum (keeping at least one
    /// entry).
    ///
    /// # Panics
    /// Panics if `cost` is negative or if the new total cost would overflow
    /// `i64`.  Both checks run before any state is touched.
    pub fn put(&mut self, key: K, cost: i64, value: V) -> Option<Arc<V>> {
        self.put_arc(key, cost, Arc::new(value))
    }

    /// Like [`put`](Cache::put), but accepts a pre-wrapped `Arc<V>` so an
    /// already-shared value is not re-wrapped.
    pub fn put_arc(&mut self, key: K, cost: i64, value: Arc<V>) -> Option<Arc<V>> {
        assert!(cost >= 0, "entry cost must be non-negative, got {cost}");

        let previous = if let Some(&idx) = self.index.get(&key) {
            let old_cost = self.nodes[idx].cost;
            // total_cost - old_cost cannot underflow: both are non-negative
            // and old_cost is part of the total.
            let new_total = checked_total(self.total_cost - old_cost, cost);
            self.nodes[idx].cost = cost;
            let previous = self.nodes[idx].value.replace(value);
            self.unlink(idx);
            self.link_after_head(idx);
            self.total_cost = new_total;
            previous
        } else {
            let new_total = checked_total(self.total_cost, cost);
            let idx = self.alloc_node(key.clone(), cost, value);
            self.index.insert(key, idx);
            self.link_after_head(idx);
            self.total_cost = new_total;
            None
        };

        self.enforce_capacity();
        previous
    }

    // -----------------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------------

    /// Removes the least-recently-used entry and returns its value, or
    /// `None` if the cache is empty.  The eviction listener fires for the
    /// removed entry.
    pub fn evict_oldest(&mut self) -> Option<Arc<V>> {
        self.evict_lru(EvictionCause::Explicit)
    }

    /// Removes the entry for `key` and returns its value.  Returns `None`
    /// (not an error) when the key is absent.  The eviction listener fires
    /// for the removed entry.
    pub fn evict(&mut self, key: &K) -> Option<Arc<V>> {
        let idx = *self.index.get(key)?;
        self.evict_index(idx, EvictionCause::Explicit)
    }

    /// Evicts every entry, oldest first, firing the eviction listener once
    /// per entry.  Leaves the total cost at zero.
    pub fn clear(&mut self) {
        while self.evict_lru(EvictionCause::Explicit).is_some() {}
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Sets the read-through retriever.  May be called at any time,
    /// including between `get` calls; replaces any previous retriever.
    pub fn set_retriever<F>(&mut self, f: F)
    where
        F: Fn(&K) -> Result<(V, i64), BoxError> + Send + Sync + 'static,
    {
        self.retriever = Some(Box::new(FnRetriever(f)));
    }

    /// Sets the retriever from any [`Retriever`] implementation.
    pub fn set_retriever_impl<R: Retriever<K, V>>(&mut self, retriever: R) {
        self.retriever = Some(Box::new(retriever));
    }

    /// Sets the eviction listener.  May be called at any time; replaces any
    /// previous listener.
    pub fn set_eviction_listener<F>(&mut self, f: F)
    where
        F: Fn(&K, Arc<V>, EvictionCause) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(FnListener(f)));
    }

    /// Sets the eviction listener from any [`EvictionListener`]
    /// implementation.
    pub fn set_eviction_listener_impl<L: EvictionListener<K, V>>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Sum of the costs of all resident entries.
    pub fn cost(&self) -> i64 {
        self.total_cost
    }

    /// The configured maximum total cost.
    pub fn max_cost(&self) -> i64 {
        self.max_cost
    }

    /// Changes the maximum total cost.
    ///
    /// Shrinking below the current total does **not** evict anything here;
    /// enforcement is lazy and happens on the next insertion that walks the
    /// eviction loop.  Keeping the setter side-effect-free is deliberate.
    ///
    /// # Panics
    /// Panics if `max_cost` is negative.
    pub fn set_max_cost(&mut self, max_cost: i64) {
        assert!(max_cost >= 0, "max_cost must be non-negative, got {max_cost}");
        self.max_cost = max_cost;
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is resident.  Does not promote the entry.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns a snapshot of the hit/miss/eviction/retrieval counters.
    pub fn stats(&self) -> Metrics {
        self.stats.snapshot()
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.len())
            .field("cost", &self.total_cost)
            .field("max_cost", &self.max_cost)
            .finish_non_exhaustive()
    }
}
