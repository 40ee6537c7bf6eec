//! # muxpool
//!
//! A bounded, generic resource pool: many concurrent callers share a
//! limited set of expensive-to-create objects (connections, handles), with
//! backpressure when the pool is exhausted and automatic discarding of
//! resources that report themselves unusable.
//!
//! All mutable pool state — the idle queue, the outstanding count, the
//! waiter queue — is owned by a single coordinator task per pool and
//! mutated only through message passing, so the core invariants need no
//! composite lock. Callers interact through the cheap-to-clone
//! [`ResourcePool`] handle:
//!
//! ```no_run
//! use muxpool::{BoxError, PoolConfig, Poolable, ResourcePool};
//!
//! struct Conn { /* ... */ }
//! impl Poolable for Conn {}
//!
//! # async fn demo() -> muxpool::Result<()> {
//! let pool = ResourcePool::new(
//!     || -> Result<Conn, BoxError> { Ok(Conn {}) },
//!     PoolConfig {
//!         idle_capacity: Some(4),
//!         max_resources: Some(16),
//!     },
//! )?;
//!
//! let conn = pool.acquire().await?;
//! // ... use conn ...
//! pool.release(conn);
//! # Ok(()) }
//! ```
//!
//! Resources that can go stale implement the optional close capability on
//! [`Poolable`]; everything else is treated as always valid. Waiters are
//! served strictly FIFO. No fairness beyond that, and no validation beyond
//! the single is-closed query, is attempted.

pub mod error;
pub mod pool;
pub mod resource;
pub mod ring;

mod mux;
mod recycle;

pub use error::{Error, Result};
pub use pool::{PoolConfig, PoolStats, ResourcePool};
pub use resource::{BoxError, Factory, Poolable};
pub use ring::Ring;
