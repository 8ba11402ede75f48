/// Counters updated on every cache operation.
///
/// Plain fields, no atomics: the cache core is single-threaded (`&mut self`)
/// throughout, so recording always happens under the caller's exclusive
/// borrow.
#[derive(Default)]
pub(crate) struct StatsCounter {
    hits: u64,
    misses: u64,
    evictions: u64,
    retrievals: u64,
}

impl StatsCounter {
    pub(crate) fn new() -> Self {
        StatsCounter::default()
    }

    #[inline]
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    #[inline]
    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    #[inline]
    pub(crate) fn record_retrieval(&mut self) {
        self.retrievals += 1;
    }

    /// Returns a point-in-time snapshot of the statistics.
    pub(crate) fn snapshot(&self) -> Metrics {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0_f64
        } else {
            self.hits as f64 / total as f64
        };
        Metrics {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            retrievals: self.retrievals,
            hit_rate,
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Number of cache hits (key found).
    pub hits: u64,
    /// Number of cache misses (key not found, whether or not a retriever
    /// then filled it).
    pub misses: u64,
    /// Number of entries evicted, for any cause.
    pub evictions: u64,
    /// Number of successful retriever invocations.
    pub retrievals: u64,
    /// `hits / (hits + misses)`, or `0.0` if no requests have been made.
    pub hit_rate: f64,
}

impl Metrics {
    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }
}
