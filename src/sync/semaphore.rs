//! Counting semaphores — a mutex that can be acquired N times before
//! blocking.
//!
//! Terms:
//! - **Slot** — the basic unit guarded by the semaphore; acquired and
//!   released in batches.
//! - **Size** — the number of slots the semaphore provides when none are
//!   outstanding.
//!
//! # Example
//! ```
//! use lungo::sync::semaphore::{CondvarSemaphore, Semaphore};
//!
//! let sem = CondvarSemaphore::new(4);
//! sem.acquire(3);
//! sem.release(3);
//! ```

use parking_lot::{Condvar, Mutex};

// ---------------------------------------------------------------------------
// Semaphore trait
// ---------------------------------------------------------------------------

/// The interface shared by the semaphore implementations in this module.
pub trait Semaphore {
    /// Blocks until `n` slots have been acquired.
    ///
    /// Panics if `n` is zero.  Behavior when acquiring more slots than the
    /// semaphore was created with is implementation-specific.
    fn acquire(&self, n: usize);

    /// Releases `n` slots so they may be acquired by others.
    ///
    /// Panics if `n` is zero.  Behavior when releasing more slots than the
    /// semaphore was created with is implementation-specific.
    fn release(&self, n: usize);
}

// ---------------------------------------------------------------------------
// CondvarSemaphore
// ---------------------------------------------------------------------------

/// A [`Semaphore`] built from a mutex and condition variable.
///
/// Acquiring or releasing N slots takes constant time per wakeup.
///
/// Releasing slots that were never acquired grows the semaphore, and
/// acquiring slots without releasing them shrinks it.  Acquiring more slots
/// than the semaphore can ever provide blocks forever.  Use
/// [`StrictSemaphore`] to turn both into panics.
pub struct CondvarSemaphore {
    slots: Mutex<usize>,
    available: Condvar,
}

impl CondvarSemaphore {
    pub fn new(size: usize) -> Self {
        CondvarSemaphore {
            slots: Mutex::new(size),
            available: Condvar::new(),
        }
    }

    /// Shared release path; returns the post-release slot count so
    /// [`StrictSemaphore`] can check for growth.
    fn release_slots(&self, n: usize) -> usize {
        assert!(n > 0, "cannot release 0 slots");
        let mut slots = self.slots.lock();
        *slots += n;
        self.available.notify_all();
        *slots
    }
}

impl Semaphore for CondvarSemaphore {
    fn acquire(&self, n: usize) {
        assert!(n > 0, "cannot acquire 0 slots");
        let mut slots = self.slots.lock();
        while *slots < n {
            self.available.wait(&mut slots);
        }
        *slots -= n;
    }

    fn release(&self, n: usize) {
        self.release_slots(n);
    }
}

// ---------------------------------------------------------------------------
// StrictSemaphore
// ---------------------------------------------------------------------------

/// A [`CondvarSemaphore`] that disallows size changes.
///
/// Panics if `release` would grow the semaphore beyond its created size, or
/// if `acquire` asks for more slots than the created size (which could
/// never succeed).
pub struct StrictSemaphore {
    inner: CondvarSemaphore,
    base: usize,
}

impl StrictSemaphore {
    pub fn new(size: usize) -> Self {
        StrictSemaphore {
            inner: CondvarSemaphore::new(size),
            base: size,
        }
    }
}

impl Semaphore for StrictSemaphore {
    fn acquire(&self, n: usize) {
        assert!(
            n <= self.base,
            "cannot acquire {n} > base size {} slots",
            self.base
        );
        self.inner.acquire(n);
    }

    fn release(&self, n: usize) {
        let slots = self.inner.release_slots(n);
        assert!(
            slots <= self.base,
            "released {n} slots, increasing size to {slots} > base size {}",
            self.base
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    /// How long we wait for something to happen before deciding it is
    /// blocked (or dead).
    const TIMER_DELAY: Duration = Duration::from_millis(100);

    /// Spawns `count` threads that each acquire `n` slots and report on the
    /// returned channel once they succeed.
    fn spawn_acquirers(
        sem: &Arc<dyn Semaphore + Send + Sync>,
        count: usize,
        n: usize,
    ) -> mpsc::Receiver<()> {
        let (done, acquired) = mpsc::channel();
        for _ in 0..count {
            let sem = Arc::clone(sem);
            let done = done.clone();
            std::thread::spawn(move || {
                sem.acquire(n);
                let _ = done.send(());
            });
        }
        acquired
    }

    fn exercise_acquire_release(sem: Arc<dyn Semaphore + Send + Sync>) {
        // Three threads acquire 3 slots each from a size-4 semaphore; the
        // test thread drip-feeds releases to move them along one by one.
        let acquired = spawn_acquirers(&sem, 3, 3);

        // The first has room immediately.
        acquired
            .recv_timeout(TIMER_DELAY)
            .expect("first acquisition should succeed");

        // The second is short by 2 slots.
        assert!(
            acquired.recv_timeout(TIMER_DELAY).is_err(),
            "second acquisition fired early"
        );
        sem.release(1); // up to 2, still short
        assert!(
            acquired.recv_timeout(TIMER_DELAY).is_err(),
            "second acquisition fired early"
        );
        sem.release(1); // up to 3, enough
        acquired
            .recv_timeout(TIMER_DELAY)
            .expect("second acquisition should succeed");

        // The third is still blocked until slots come back.
        assert!(
            acquired.recv_timeout(TIMER_DELAY).is_err(),
            "third acquisition fired early"
        );
        sem.release(4);
        acquired
            .recv_timeout(TIMER_DELAY)
            .expect("third acquisition should succeed");
    }

    #[test]
    fn condvar_acquire_release_ordering() {
        exercise_acquire_release(Arc::new(CondvarSemaphore::new(4)));
    }

    #[test]
    fn strict_acquire_release_ordering() {
        exercise_acquire_release(Arc::new(StrictSemaphore::new(4)));
    }

    #[test]
    #[should_panic(expected = "cannot acquire 0 slots")]
    fn zero_slot_acquire_panics() {
        CondvarSemaphore::new(1).acquire(0);
    }

    #[test]
    #[should_panic(expected = "cannot release 0 slots")]
    fn zero_slot_release_panics() {
        CondvarSemaphore::new(1).release(0);
    }

    #[test]
    #[should_panic(expected = "cannot acquire 2 > base size 1")]
    fn strict_oversized_acquire_panics() {
        StrictSemaphore::new(1).acquire(2);
    }

    #[test]
    #[should_panic(expected = "increasing size to 2 > base size 1")]
    fn strict_size_increase_panics() {
        StrictSemaphore::new(1).release(1);
    }
}
