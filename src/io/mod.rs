//! Small I/O helpers, independent of the cache.

pub mod write_counter;

pub use write_counter::CountingWriter;
