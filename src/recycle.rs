//! Reply-slot recycling.
//!
//! Every acquisition needs a place for the coordinator to deliver its
//! outcome. Allocating that slot per call would put an allocation on the
//! hot path, so used slots are returned to a ring-backed free list and
//! handed out again. This is purely an optimization: `get` returning
//! `None` just means the caller allocates a fresh slot.
//!
//! Release notices and close signals carry no heap part in this design,
//! so there is nothing to recycle for them.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::Result;
use crate::ring::Ring;

/// Reply slots pre-built per pool at construction.
pub(crate) const PREALLOC_REPLY_SLOTS: usize = 128;

// ---------------------------------------------------------------------------
// FreeList
// ---------------------------------------------------------------------------

/// Lock-protected free list of reusable objects.
pub(crate) struct FreeList<T> {
    ring: Mutex<Ring<T>>,
}

impl<T> FreeList<T> {
    /// Create a free list pre-populated with `count` objects built by `make`.
    pub(crate) fn with_prealloc(count: usize, mut make: impl FnMut() -> T) -> Self {
        let mut ring = Ring::with_capacity(count);
        for _ in 0..count {
            ring.enqueue(make());
        }
        Self {
            ring: Mutex::new(ring),
        }
    }

    /// Pop a recycled object, or `None` if the list is empty.
    pub(crate) fn get(&self) -> Option<T> {
        self.ring.lock().dequeue()
    }

    /// Return a used object for later reuse.
    pub(crate) fn put(&self, value: T) {
        self.ring.lock().enqueue(value);
    }

    /// Number of objects currently parked in the list. Diagnostic only.
    pub(crate) fn len(&self) -> usize {
        self.ring.lock().len()
    }
}

// ---------------------------------------------------------------------------
// ReplySlot
// ---------------------------------------------------------------------------

/// One-outcome rendezvous between the coordinator and a single caller.
///
/// The coordinator fills the cell and signals; the caller drains it. A slot
/// serves one acquisition at a time and the cell is always drained before
/// the slot goes back to the free list, so reuse never observes a stale
/// outcome.
pub(crate) struct ReplySlot<R> {
    cell: Mutex<Option<Result<R>>>,
    ready: Notify,
}

impl<R> ReplySlot<R> {
    pub(crate) fn new() -> Self {
        Self {
            cell: Mutex::new(None),
            ready: Notify::new(),
        }
    }

    /// Deliver the outcome of an acquisition and wake the caller.
    pub(crate) fn fulfill(&self, outcome: Result<R>) {
        *self.cell.lock() = Some(outcome);
        self.ready.notify_one();
    }

    /// Wait for the outcome, draining the cell for the next use.
    pub(crate) async fn wait(&self) -> Result<R> {
        loop {
            if let Some(outcome) = self.cell.lock().take() {
                return outcome;
            }
            self.ready.notified().await;
        }
    }
}

/// Allocate a fresh shareable slot.
pub(crate) fn fresh_slot<R>() -> Arc<ReplySlot<R>> {
    Arc::new(ReplySlot::new())
}
