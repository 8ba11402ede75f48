//! Standalone concurrency primitives, independent of the cache.

pub mod refcount;
pub mod semaphore;

pub use refcount::{Instance, RefCount};
pub use semaphore::{CondvarSemaphore, Semaphore, StrictSemaphore};
