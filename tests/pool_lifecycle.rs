//! Resource lifecycle tests: creation, idle reuse, capacity eviction, and
//! stale-resource discard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use muxpool::{BoxError, PoolStats, Poolable, ResourcePool};

// ---------------------------------------------------------------------------
// Test resource
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ConnState {
    closed: AtomicBool,
    close_calls: AtomicU64,
}

struct Conn {
    id: u64,
    state: Arc<ConnState>,
}

impl Poolable for Conn {
    fn close(&mut self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

fn conn_factory() -> impl Fn() -> Result<Conn, BoxError> + Send + Sync + 'static {
    let next_id = AtomicU64::new(0);
    move || {
        Ok(Conn {
            id: next_id.fetch_add(1, Ordering::SeqCst),
            state: Arc::new(ConnState::default()),
        })
    }
}

async fn wait_until(pool: &ResourcePool<Conn>, cond: impl Fn(&PoolStats) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if cond(&pool.stats()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("pool never reached expected state");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn released_resource_is_reused() {
    let pool = ResourcePool::with_limits(conn_factory(), Some(4), Some(4)).unwrap();

    let first = pool.acquire().await.unwrap();
    let first_id = first.id;
    pool.release(first);
    wait_until(&pool, |s| s.idle == 1).await;

    let again = pool.acquire().await.unwrap();
    assert_eq!(again.id, first_id);
    assert_eq!(pool.stats().created, 1);
    assert_eq!(pool.num_resources(), 1);
}

#[tokio::test]
async fn idle_capacity_two_max_three_scenario() {
    let pool = ResourcePool::with_limits(conn_factory(), Some(2), Some(3)).unwrap();

    let r1 = pool.acquire().await.unwrap();
    let r2 = pool.acquire().await.unwrap();
    let r3 = pool.acquire().await.unwrap();
    assert_eq!(pool.num_resources(), 3);
    let (r1_id, r3_state) = (r1.id, Arc::clone(&r3.state));

    // First two land in idle, filling it to capacity.
    pool.release(r1);
    pool.release(r2);
    wait_until(&pool, |s| s.idle == 2).await;
    assert_eq!(pool.num_resources(), 3);

    // Third release finds idle full: closed and discarded.
    pool.release(r3);
    wait_until(&pool, |s| s.num_resources == 2).await;
    assert_eq!(r3_state.close_calls.load(Ordering::SeqCst), 1);

    // Idle is FIFO, so the next acquire yields r1.
    let next = pool.acquire().await.unwrap();
    assert_eq!(next.id, r1_id);
    assert_eq!(pool.stats().idle, 1);
}

#[tokio::test]
async fn closed_resource_released_is_discarded() {
    let pool = ResourcePool::with_limits(conn_factory(), Some(4), Some(4)).unwrap();

    let conn = pool.acquire().await.unwrap();
    let (old_id, state) = (conn.id, Arc::clone(&conn.state));
    // The underlying handle dies while checked out.
    state.closed.store(true, Ordering::SeqCst);
    pool.release(conn);
    wait_until(&pool, |s| s.num_resources == 0).await;
    assert_eq!(pool.stats().destroyed, 1);

    // A fresh resource comes back, never the dead one.
    let fresh = pool.acquire().await.unwrap();
    assert_ne!(fresh.id, old_id);
    assert_eq!(pool.num_resources(), 1);
}

#[tokio::test]
async fn stale_idle_resource_discarded_on_acquire() {
    let pool = ResourcePool::with_limits(conn_factory(), Some(4), Some(4)).unwrap();

    let conn = pool.acquire().await.unwrap();
    let (old_id, state) = (conn.id, Arc::clone(&conn.state));
    pool.release(conn);
    wait_until(&pool, |s| s.idle == 1).await;

    // Dies while parked in the idle queue.
    state.closed.store(true, Ordering::SeqCst);

    let fresh = pool.acquire().await.unwrap();
    assert_ne!(fresh.id, old_id);
    let stats = pool.stats();
    assert_eq!(stats.destroyed, 1);
    assert_eq!(stats.created, 2);
    assert_eq!(stats.num_resources, 1);
}
