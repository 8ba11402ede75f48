mod builder;
mod cache;
mod error;
mod metrics;
pub mod io;
pub mod listener;
pub mod retriever;
pub mod sync;

pub use builder::CacheBuilder;
pub use cache::Cache;
pub use error::{BoxError, CacheError};
pub use metrics::stats::Metrics;
