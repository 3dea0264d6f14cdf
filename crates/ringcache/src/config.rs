//! Configuration for cache behavior.

use crate::error::CacheError;
use std::time::Duration;

/// Number of generations a cache keeps by default.
pub const DEFAULT_BUCKET_COUNT: usize = 3;

/// Default period between generation rotations.
pub const DEFAULT_GENERATION_PERIOD: Duration = Duration::from_secs(300);

/// Configuration for a [`RingCache`](crate::RingCache).
///
/// Together, `bucket_count` and `generation_period` bound every entry's
/// lifetime: resident for at least one period and at most
/// `bucket_count * generation_period`. Both are fixed once the cache is
/// opened.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Number of ring generations.
    ///
    /// Default: 3
    pub bucket_count: usize,

    /// Period between rotations.
    ///
    /// Default: 5 minutes
    pub generation_period: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            generation_period: DEFAULT_GENERATION_PERIOD,
        }
    }
}

impl CacheConfig {
    /// Sets the number of generations.
    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Sets the rotation period.
    pub fn with_generation_period(mut self, period: Duration) -> Self {
        self.generation_period = period;
        self
    }

    /// Rejects configurations the ring cannot be built from.
    pub(crate) fn validate(&self) -> Result<(), CacheError> {
        if self.bucket_count == 0 {
            return Err(CacheError::ZeroBuckets);
        }
        if self.generation_period.is_zero() {
            return Err(CacheError::ZeroPeriod);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.bucket_count, 3);
        assert_eq!(config.generation_period, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = CacheConfig::default()
            .with_bucket_count(5)
            .with_generation_period(Duration::from_secs(1));
        assert_eq!(config.bucket_count, 5);
        assert_eq!(config.generation_period, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(matches!(
            CacheConfig::default().with_bucket_count(0).validate(),
            Err(CacheError::ZeroBuckets)
        ));
        assert!(matches!(
            CacheConfig::default()
                .with_generation_period(Duration::ZERO)
                .validate(),
            Err(CacheError::ZeroPeriod)
        ));
    }
}
