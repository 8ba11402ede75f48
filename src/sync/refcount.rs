//! Open/close reference counting for objects that hold heavy resources.
//!
//! A [`RefCount`] tracks how many handles to a resource are live.  The
//! opener callback runs on the 0→1 transition, the closer on the 1→0
//! transition, so the owning object can release resources when idle and
//! reopen them on demand.
//!
//! # Example
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use lungo::sync::refcount::RefCount;
//!
//! let opens = Arc::new(AtomicUsize::new(0));
//! let o = Arc::clone(&opens);
//! let rc = RefCount::new(
//!     move || {
//!         o.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     },
//!     || Ok(()),
//! );
//!
//! let first = rc.increment().unwrap();
//! let second = rc.increment().unwrap();
//! assert_eq!(opens.load(Ordering::SeqCst), 1); // opened once, shared twice
//!
//! drop(second);
//! drop(first); // closer runs when the last instance goes away
//! assert_eq!(rc.instances(), 0);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BoxError;

struct State {
    instances: usize,
    opener: Box<dyn FnMut() -> Result<(), BoxError> + Send>,
    closer: Box<dyn FnMut() -> Result<(), BoxError> + Send>,
}

/// Counts open instances of a resource, opening and closing it at the
/// boundaries.
///
/// Meant to be an internal component of another object, not something your
/// API's users see.  Openers and closers run under the count's lock, so
/// they are never executed concurrently — and must not call back into the
/// same `RefCount`.
pub struct RefCount {
    inner: Arc<Mutex<State>>,
}

impl RefCount {
    pub fn new<O, C>(opener: O, closer: C) -> Self
    where
        O: FnMut() -> Result<(), BoxError> + Send + 'static,
        C: FnMut() -> Result<(), BoxError> + Send + 'static,
    {
        RefCount {
            inner: Arc::new(Mutex::new(State {
                instances: 0,
                opener: Box::new(opener),
                closer: Box::new(closer),
            })),
        }
    }

    /// Number of open instances: the number of [`Instance::close`] calls
    /// (without intervening increments) before the resource actually
    /// closes.
    pub fn instances(&self) -> usize {
        self.inner.lock().instances
    }

    /// Increments the number of open instances, invoking the opener if this
    /// is the first.
    ///
    /// If the opener fails, the error is returned and the count stays at
    /// zero.  Close the returned [`Instance`] (or just drop it) when done.
    pub fn increment(&self) -> Result<Instance, BoxError> {
        let mut state = self.inner.lock();
        if state.instances == 0 {
            (state.opener)()?;
        }
        state.instances += 1;
        Ok(Instance {
            inner: Some(Arc::clone(&self.inner)),
        })
    }
}

/// A handle representing one open instance.
///
/// Closing (or dropping) the last live `Instance` invokes the closer.
pub struct Instance {
    /// `None` once this instance has been closed.
    inner: Option<Arc<Mutex<State>>>,
}

impl Instance {
    /// Decrements the count, invoking the closer if this was the last open
    /// instance.
    ///
    /// If the closer fails, the count is left untouched so `close` can be
    /// retried.  Calls after a successful close are no-ops.
    pub fn close(&mut self) -> Result<(), BoxError> {
        let Some(inner) = self.inner.take() else {
            return Ok(()); // already closed
        };

        let mut state = inner.lock();
        if state.instances == 1 {
            if let Err(err) = (state.closer)() {
                drop(state);
                self.inner = Some(inner); // don't decrement; allow retry
                return Err(err);
            }
        }
        state.instances -= 1;
        Ok(())
    }
}

impl Drop for Instance {
    /// Best-effort close: a closer error during drop is discarded.  Call
    /// [`close`](Instance::close) explicitly when you need the error.
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst};

    #[derive(Default)]
    struct Counters {
        opens: AtomicUsize,
        closes: AtomicUsize,
        fail_open: AtomicBool,
        fail_close: AtomicBool,
    }

    fn counted(counters: &Arc<Counters>) -> RefCount {
        let on_open = Arc::clone(counters);
        let on_close = Arc::clone(counters);
        RefCount::new(
            move || {
                on_open.opens.fetch_add(1, SeqCst);
                if on_open.fail_open.load(SeqCst) {
                    Err("open failed".into())
                } else {
                    Ok(())
                }
            },
            move || {
                on_close.closes.fetch_add(1, SeqCst);
                if on_close.fail_close.load(SeqCst) {
                    Err("close failed".into())
                } else {
                    Ok(())
                }
            },
        )
    }

    #[test]
    fn first_increment_opens_once() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        let _first = rc.increment().unwrap();
        assert_eq!(counters.opens.load(SeqCst), 1);
        assert_eq!(rc.instances(), 1);

        let _second = rc.increment().unwrap();
        assert_eq!(counters.opens.load(SeqCst), 1, "second increment must not reopen");
        assert_eq!(rc.instances(), 2);
    }

    #[test]
    fn last_close_closes() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        let mut instance = rc.increment().unwrap();
        instance.close().unwrap();
        assert_eq!(counters.closes.load(SeqCst), 1);
        assert_eq!(rc.instances(), 0);

        // Closing again is a no-op.
        instance.close().unwrap();
        assert_eq!(counters.closes.load(SeqCst), 1);
    }

    #[test]
    fn reopen_after_close() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        drop(rc.increment().unwrap());
        assert_eq!(rc.instances(), 0);

        let _again = rc.increment().unwrap();
        assert_eq!(counters.opens.load(SeqCst), 2);
        assert_eq!(counters.closes.load(SeqCst), 1);
        assert_eq!(rc.instances(), 1);
    }

    #[test]
    fn open_error_leaves_count_at_zero() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        counters.fail_open.store(true, SeqCst);
        assert!(rc.increment().is_err());
        assert_eq!(counters.opens.load(SeqCst), 1);
        assert_eq!(rc.instances(), 0);
    }

    #[test]
    fn close_error_keeps_instance_for_retry() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        let mut instance = rc.increment().unwrap();

        counters.fail_close.store(true, SeqCst);
        assert!(instance.close().is_err());
        assert_eq!(rc.instances(), 1, "failed close must not decrement");

        counters.fail_close.store(false, SeqCst);
        instance.close().unwrap();
        assert_eq!(counters.closes.load(SeqCst), 2);
        assert_eq!(rc.instances(), 0);
    }

    #[test]
    fn drop_closes_best_effort() {
        let counters = Arc::new(Counters::default());
        let rc = counted(&counters);

        {
            let _instance = rc.increment().unwrap();
        }
        assert_eq!(counters.closes.load(SeqCst), 1);
        assert_eq!(rc.instances(), 0);
    }
}
