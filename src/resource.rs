//! Collaborator contracts: poolable resources and factories.

use async_trait::async_trait;

/// Boxed error type returned by factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A value that can be managed by a [`ResourcePool`](crate::pool::ResourcePool).
///
/// The default methods render the optional close capability: a type that
/// keeps them is treated as always valid and is never explicitly closed by
/// the pool. Types that override them participate in validity checks and
/// cleanup:
///
/// - [`close`](Poolable::close) releases the underlying handle and must be
///   idempotent.
/// - [`is_closed`](Poolable::is_closed) is a pure query; once it returns
///   `true` the pool discards the resource instead of handing it out again.
pub trait Poolable: Send + 'static {
    /// Release the underlying handle. Idempotent.
    fn close(&mut self) {}

    /// Whether the underlying handle has become unusable.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Produces new resources on demand for a pool.
///
/// The coordinator invokes [`create`](Factory::create) whenever a new
/// resource is needed; calls are serialized with all other pool
/// bookkeeping, so `create` is never invoked concurrently with itself and
/// a slow factory stalls every operation on that pool instance. Earlier
/// results may still be checked out when `create` runs again.
///
/// Plain closures work as factories:
///
/// ```no_run
/// use muxpool::{BoxError, PoolConfig, ResourcePool};
///
/// struct Conn;
/// impl muxpool::Poolable for Conn {}
///
/// # async fn demo() -> muxpool::Result<()> {
/// let pool = ResourcePool::new(
///     || -> Result<Conn, BoxError> { Ok(Conn) },
///     PoolConfig::default(),
/// )?;
/// # Ok(()) }
/// ```
#[async_trait]
pub trait Factory<R>: Send + Sync + 'static {
    /// Create a new resource, or report why one could not be created.
    async fn create(&self) -> Result<R, BoxError>;
}

#[async_trait]
impl<R, F> Factory<R> for F
where
    R: Poolable,
    F: Fn() -> Result<R, BoxError> + Send + Sync + 'static,
{
    async fn create(&self) -> Result<R, BoxError> {
        self()
    }
}
