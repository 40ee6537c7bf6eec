//! The coordinator: a single task owning all mutable pool state.
//!
//! One `Mux` runs per pool instance. It exclusively owns the idle ring and
//! the waiter queue and processes exactly one message at a time from three
//! channels (acquire, release, close), which is what makes the transitions
//! below race-free without a lock around the composite state. Only the
//! observable counters live behind a mutex, because callers read them from
//! outside this serialized stream.
//!
//! No precedence exists between the channels: `select!` polls them in an
//! unspecified order, so an acquire is never guaranteed priority over a
//! release or vice versa. Within one channel, messages are processed in
//! submission order.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::pool::{PoolConfig, Shared};
use crate::recycle::ReplySlot;
use crate::resource::{Factory, Poolable};
use crate::ring::Ring;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A pending acquisition. Carries its own reply slot so concurrent callers
/// never see each other's outcomes.
pub(crate) struct AcquireRequest<R> {
    pub(crate) slot: Arc<ReplySlot<R>>,
}

/// A resource coming back from a caller.
pub(crate) struct ReleaseNotice<R> {
    pub(crate) resource: R,
}

/// Terminal shutdown signal.
pub(crate) struct CloseSignal;

// ---------------------------------------------------------------------------
// Mux
// ---------------------------------------------------------------------------

pub(crate) struct Mux<R: Poolable> {
    factory: Box<dyn Factory<R>>,
    config: PoolConfig,
    shared: Arc<Shared<R>>,
    idle: Ring<R>,
    waiters: VecDeque<AcquireRequest<R>>,
    acq_rx: mpsc::UnboundedReceiver<AcquireRequest<R>>,
    rel_rx: mpsc::UnboundedReceiver<ReleaseNotice<R>>,
    close_rx: mpsc::UnboundedReceiver<CloseSignal>,
}

impl<R: Poolable> Mux<R> {
    pub(crate) fn new(
        factory: Box<dyn Factory<R>>,
        config: PoolConfig,
        shared: Arc<Shared<R>>,
        acq_rx: mpsc::UnboundedReceiver<AcquireRequest<R>>,
        rel_rx: mpsc::UnboundedReceiver<ReleaseNotice<R>>,
        close_rx: mpsc::UnboundedReceiver<CloseSignal>,
    ) -> Self {
        Self {
            factory,
            config,
            shared,
            idle: Ring::new(),
            waiters: VecDeque::new(),
            acq_rx,
            rel_rx,
            close_rx,
        }
    }

    /// Event loop. Runs until a close signal arrives or every pool handle
    /// has been dropped, then drains and terminates.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.acq_rx.recv() => match msg {
                    Some(request) => self.handle_acquire(request).await,
                    None => break,
                },
                msg = self.rel_rx.recv() => match msg {
                    Some(notice) => self.handle_release(notice.resource).await,
                    None => break,
                },
                // Some(_) is an explicit close; None means the last pool
                // handle is gone. Both end the loop.
                _ = self.close_rx.recv() => break,
            }
            self.publish_queue_depths();
        }
        self.shutdown();
    }

    // -- acquire ------------------------------------------------------------

    async fn handle_acquire(&mut self, request: AcquireRequest<R>) {
        // Serve from idle, discarding anything that died while parked.
        while let Some(resource) = self.idle.dequeue() {
            if resource.is_closed() {
                tracing::trace!("discarding stale idle resource");
                self.note_destroyed();
                continue;
            }
            self.note_acquired();
            request.slot.fulfill(Ok(resource));
            return;
        }

        if let Some(max) = self.config.max_resources {
            if self.shared.stats.lock().num_resources >= max {
                tracing::debug!(max, "pool saturated, parking waiter");
                self.waiters.push_back(request);
                return;
            }
        }

        match self.factory.create().await {
            Ok(resource) => {
                self.note_created();
                self.note_acquired();
                tracing::debug!(
                    num_resources = self.shared.stats.lock().num_resources,
                    "created new resource"
                );
                request.slot.fulfill(Ok(resource));
            }
            Err(source) => request.slot.fulfill(Err(Error::factory(source))),
        }
    }

    // -- release ------------------------------------------------------------

    async fn handle_release(&mut self, mut resource: R) {
        self.note_released();

        if let Some(waiter) = self.waiters.pop_front() {
            // Direct handoff: the idle ring is bypassed entirely, which
            // both preserves FIFO order and skips a round trip.
            if !resource.is_closed() {
                tracing::trace!("handing released resource to waiter");
                self.note_acquired();
                waiter.slot.fulfill(Ok(resource));
                return;
            }
            // The returned resource is dead; manufacture a replacement for
            // the waiter. Its slot in the count is reused on success.
            match self.factory.create().await {
                Ok(fresh) => {
                    {
                        let mut stats = self.shared.stats.lock();
                        stats.created += 1;
                        stats.destroyed += 1;
                    }
                    self.note_acquired();
                    tracing::debug!("replaced stale resource for waiter");
                    waiter.slot.fulfill(Ok(fresh));
                }
                Err(source) => {
                    self.note_destroyed();
                    waiter.slot.fulfill(Err(Error::factory(source)));
                }
            }
            return;
        }

        if resource.is_closed() {
            tracing::trace!("discarding stale released resource");
            self.note_destroyed();
            return;
        }
        if let Some(capacity) = self.config.idle_capacity {
            if self.idle.len() >= capacity {
                tracing::trace!(capacity, "idle queue full, discarding released resource");
                resource.close();
                self.note_destroyed();
                return;
            }
        }
        self.idle.enqueue(resource);
    }

    // -- shutdown -----------------------------------------------------------

    /// Terminal transition: close idle resources, fail parked waiters, and
    /// answer anything already queued. Later submissions fail at the send
    /// because the receivers are gone.
    fn shutdown(&mut self) {
        tracing::debug!(
            idle = self.idle.len(),
            waiters = self.waiters.len(),
            "pool closing"
        );
        while let Some(mut resource) = self.idle.dequeue() {
            resource.close();
            self.note_destroyed();
        }
        for waiter in self.waiters.drain(..) {
            waiter.slot.fulfill(Err(Error::Closed));
        }

        self.acq_rx.close();
        self.rel_rx.close();
        while let Ok(request) = self.acq_rx.try_recv() {
            request.slot.fulfill(Err(Error::Closed));
        }
        while let Ok(notice) = self.rel_rx.try_recv() {
            let mut resource = notice.resource;
            resource.close();
            self.note_destroyed();
        }
        self.publish_queue_depths();
    }

    // -- accounting ---------------------------------------------------------

    fn note_created(&self) {
        let mut stats = self.shared.stats.lock();
        stats.num_resources += 1;
        stats.created += 1;
    }

    fn note_destroyed(&self) {
        let mut stats = self.shared.stats.lock();
        stats.num_resources = stats.num_resources.saturating_sub(1);
        stats.destroyed += 1;
    }

    fn note_acquired(&self) {
        self.shared.stats.lock().acquired += 1;
    }

    fn note_released(&self) {
        self.shared.stats.lock().released += 1;
    }

    fn publish_queue_depths(&self) {
        let mut stats = self.shared.stats.lock();
        stats.idle = self.idle.len();
        stats.waiters = self.waiters.len();
    }
}
