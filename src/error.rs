use thiserror::Error;

/// Boxed, thread-safe error value supplied by user callbacks (retrievers,
/// refcount openers/closers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`Cache::get`](crate::Cache::get).
///
/// `Miss` is the only error the cache itself originates.  Everything else is
/// a retriever failure passed through unchanged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is not present and no retriever is configured.
    #[error("entry not present and no retriever is configured")]
    Miss,

    /// The retriever failed.  The error is propagated verbatim; the cache
    /// attaches no context of its own.
    #[error(transparent)]
    Retrieval(#[from] BoxError),
}

impl CacheError {
    /// Returns `true` for the plain "not found, no retriever" case.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }
}
