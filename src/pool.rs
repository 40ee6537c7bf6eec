//! Public pool surface: configuration, stats, and the `ResourcePool` handle.
//!
//! The handle is a thin, allocation-aware front end: it builds (or
//! recycles) messages, hands them to the coordinator, and for `acquire`
//! blocks on a per-call reply slot. All actual state transitions happen in
//! [`mux`](crate::mux).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::mux::{AcquireRequest, CloseSignal, Mux, ReleaseNotice};
use crate::recycle::{FreeList, PREALLOC_REPLY_SLOTS, ReplySlot, fresh_slot};
use crate::resource::{Factory, Poolable};

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Configuration for a resource pool.
///
/// `None` for either limit means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Maximum number of idle (unused, parked) resources to retain.
    pub idle_capacity: Option<usize>,
    /// Maximum number of resources (idle + checked out) ever outstanding.
    pub max_resources: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_capacity: Some(8),
            max_resources: None,
        }
    }
}

impl PoolConfig {
    /// A configuration with no limits at all.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            idle_capacity: None,
            max_resources: None,
        }
    }

    /// Validate the configuration, returning an error if invalid.
    ///
    /// # Errors
    /// `max_resources == Some(0)` is rejected: no resource could ever be
    /// created and every acquisition would park forever.
    pub fn validate(&self) -> Result<()> {
        if self.max_resources == Some(0) {
            return Err(Error::configuration("max_resources must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PoolStats
// ---------------------------------------------------------------------------

/// Pool statistics.
///
/// Written only by the coordinator; reads may lag in-flight transitions
/// that have not yet committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Resources currently known to exist (idle + checked out).
    pub num_resources: usize,
    /// Resources currently parked in the idle queue.
    pub idle: usize,
    /// Acquisitions currently parked waiting for a release.
    pub waiters: usize,
    /// Total successful acquisitions.
    pub acquired: u64,
    /// Total release notices processed.
    pub released: u64,
    /// Total resources ever created.
    pub created: u64,
    /// Total resources ever discarded.
    pub destroyed: u64,
    /// Reply slots currently parked in the recycling free list. Diagnostic.
    pub free_reply_slots: usize,
}

/// State shared between the coordinator and the pool handles.
pub(crate) struct Shared<R> {
    /// Counters live behind their own lock purely because they are read
    /// from arbitrary caller threads outside the coordinator's serialized
    /// stream.
    pub(crate) stats: Mutex<PoolStats>,
    reply_slots: FreeList<Arc<ReplySlot<R>>>,
}

impl<R> Shared<R> {
    fn new() -> Self {
        Self {
            stats: Mutex::new(PoolStats::default()),
            reply_slots: FreeList::with_prealloc(PREALLOC_REPLY_SLOTS, fresh_slot),
        }
    }

    fn slot(&self) -> Arc<ReplySlot<R>> {
        self.reply_slots.get().unwrap_or_else(fresh_slot)
    }

    fn recycle_slot(&self, slot: Arc<ReplySlot<R>>) {
        self.reply_slots.put(slot);
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

/// A bounded pool of reusable resources.
///
/// Cloning the pool produces another handle to the same pool. All state
/// lives with a dedicated coordinator task; handles only pass messages.
///
/// Dropping the last handle shuts the pool down exactly as
/// [`close`](ResourcePool::close) does.
pub struct ResourcePool<R: Poolable> {
    inner: Arc<PoolInner<R>>,
}

struct PoolInner<R: Poolable> {
    acq_tx: mpsc::UnboundedSender<AcquireRequest<R>>,
    rel_tx: mpsc::UnboundedSender<ReleaseNotice<R>>,
    close_tx: mpsc::UnboundedSender<CloseSignal>,
    shared: Arc<Shared<R>>,
}

impl<R: Poolable> Clone for ResourcePool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Poolable> fmt::Debug for ResourcePool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.inner.shared.stats.lock().clone();
        f.debug_struct("ResourcePool").field("stats", &stats).finish()
    }
}

impl<R: Poolable> ResourcePool<R> {
    /// Create a pool and spawn its coordinator immediately.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `config` is invalid.
    pub fn new<F>(factory: F, config: PoolConfig) -> Result<Self>
    where
        F: Factory<R>,
    {
        config.validate()?;
        let (acq_tx, acq_rx) = mpsc::unbounded_channel();
        let (rel_tx, rel_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new());

        let mux = Mux::new(
            Box::new(factory),
            config,
            Arc::clone(&shared),
            acq_rx,
            rel_rx,
            close_rx,
        );
        tokio::spawn(mux.run());

        Ok(Self {
            inner: Arc::new(PoolInner {
                acq_tx,
                rel_tx,
                close_tx,
                shared,
            }),
        })
    }

    /// Create a pool with explicit limits. `None` means unbounded.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the limits are invalid.
    pub fn with_limits<F>(
        factory: F,
        idle_capacity: Option<usize>,
        max_resources: Option<usize>,
    ) -> Result<Self>
    where
        F: Factory<R>,
    {
        Self::new(
            factory,
            PoolConfig {
                idle_capacity,
                max_resources,
            },
        )
    }

    /// Acquire a resource: an idle one, a fresh one from the factory, or —
    /// when the pool is saturated — whichever comes back first, in strict
    /// FIFO order among waiters.
    ///
    /// # Errors
    /// - [`Error::Factory`] if a new resource was needed and the factory
    ///   failed; the pool keeps serving subsequent requests.
    /// - [`Error::Closed`] if the pool was closed before or while waiting.
    ///
    /// # Cancellation
    /// Dropping this future after it parked as a waiter leaks the resource
    /// that is later delivered to it. Callers racing `acquire` against a
    /// timer must either accept that or keep the future around to drain.
    pub async fn acquire(&self) -> Result<R> {
        let slot = self.inner.shared.slot();
        let request = AcquireRequest {
            slot: Arc::clone(&slot),
        };
        self.inner.acq_tx.send(request).map_err(|_| Error::Closed)?;
        let outcome = slot.wait().await;
        self.inner.shared.recycle_slot(slot);
        outcome
    }

    /// Return a resource to the pool. Never blocks: the notice is queued
    /// and the coordinator processes it whenever it next runs.
    ///
    /// A resource whose [`is_closed`](Poolable::is_closed) reports `true`
    /// is discarded rather than parked; a live resource is handed to the
    /// head waiter if one exists, parked as idle if there is room, and
    /// closed and discarded otherwise.
    pub fn release(&self, resource: R) {
        if let Err(rejected) = self.inner.rel_tx.send(ReleaseNotice { resource }) {
            // Coordinator already gone: close inline so nothing leaks.
            let mut resource = rejected.0.resource;
            resource.close();
            let mut stats = self.inner.shared.stats.lock();
            stats.num_resources = stats.num_resources.saturating_sub(1);
            stats.destroyed += 1;
        }
    }

    /// Shut the pool down. Never blocks and does not wait for the drain:
    /// the coordinator closes every idle resource, fails every parked
    /// waiter with [`Error::Closed`], and terminates. Idempotent.
    ///
    /// Acquisitions submitted after shutdown fail fast with
    /// [`Error::Closed`].
    pub fn close(&self) {
        let _ = self.inner.close_tx.send(CloseSignal);
    }

    /// Number of resources currently known to exist (idle + checked out).
    #[must_use]
    pub fn num_resources(&self) -> usize {
        self.inner.shared.stats.lock().num_resources
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let free_reply_slots = self.inner.shared.reply_slots.len();
        let mut stats = self.inner.shared.stats.lock().clone();
        stats.free_reply_slots = free_reply_slots;
        stats
    }
}
