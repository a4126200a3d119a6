//! Reference-counted busy flag shared by the stores.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts operations in flight. The store is busy while the count is non-zero.
#[derive(Debug, Default)]
pub struct BusyCounter {
    in_flight: AtomicUsize,
}

impl BusyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one operation as started. Dropping the guard marks it finished.
    pub fn enter(&self) -> BusyGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard { counter: self }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[must_use = "the operation is only counted while the guard is alive"]
#[derive(Debug)]
pub struct BusyGuard<'a> {
    counter: &'a BusyCounter,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
