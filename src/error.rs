//! Error types for pool operations

use thiserror::Error;

use crate::resource::BoxError;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pool operations.
///
/// A stale resource being discarded is not an error: the pool silently
/// replaces it with the next idle resource or a freshly created one.
#[derive(Error, Debug)]
pub enum Error {
    /// Pool configuration is invalid
    #[error("configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },

    /// The factory failed to create a resource.
    ///
    /// Surfaced to exactly the caller whose acquisition triggered (or was
    /// waiting on) the creation attempt; never retried by the pool.
    #[error("resource factory failed")]
    Factory {
        /// The underlying factory error
        #[source]
        source: BoxError,
    },

    /// The pool has been closed
    #[error("resource pool closed")]
    Closed,
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a factory error
    pub(crate) fn factory(source: BoxError) -> Self {
        Self::Factory { source }
    }

    /// Whether this error means the pool is permanently unusable
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
