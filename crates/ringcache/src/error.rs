//! Error types for cache operations.

use crate::resolver::ResolveError;
use thiserror::Error;

/// Errors surfaced by the cache.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache has been shut down; its control task no longer runs.
    #[error("cache has been shut down")]
    ShutDown,

    /// No cache is registered under the requested name.
    #[error("no cache named {name:?}")]
    UnknownCache {
        /// The name that was looked up.
        name: String,
    },

    /// A cache is already registered under this name.
    #[error("a cache named {name:?} already exists")]
    DuplicateCache {
        /// The name that collided.
        name: String,
    },

    /// A ring needs at least one bucket.
    #[error("bucket_count must be at least 1")]
    ZeroBuckets,

    /// The generation period must be positive.
    #[error("generation_period must be positive")]
    ZeroPeriod,

    /// The resolver failed; nothing was cached for the batch.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl CacheError {
    /// Returns `true` if retrying the same call could succeed (the failure
    /// was in the resolver, not the cache).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resolve(_))
    }

    /// Returns `true` if this error indicates the cache is permanently
    /// unusable.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShutDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CacheError::ShutDown.is_terminal());
        assert!(!CacheError::ShutDown.is_recoverable());

        let resolve = CacheError::from(ResolveError::Failed("x".into()));
        assert!(resolve.is_recoverable());
        assert!(!resolve.is_terminal());
    }

    #[test]
    fn test_messages_name_the_cache() {
        let err = CacheError::UnknownCache { name: "users".into() };
        assert!(err.to_string().contains("users"));
    }
}
