//! Name → cache handle registry.
//!
//! A cache handle works fine on its own; the registry exists for hosts that
//! address caches by name from several places and want one authority for
//! who exists.

use crate::cache::RingCache;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::resolver::Resolver;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// A registry of named caches sharing one key/value type.
///
/// Names are unique: opening a second cache under an existing name is
/// rejected rather than silently replacing a cache that may have live
/// users. Distinct names are fully independent: separate rings, separate
/// control tasks, no shared storage.
pub struct Registry<K, V> {
    caches: RwLock<HashMap<String, RingCache<K, V>>>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a cache under `name` and registers it.
    pub fn open<R>(
        &self,
        name: &str,
        resolver: R,
        config: CacheConfig,
    ) -> Result<RingCache<K, V>, CacheError>
    where
        R: Resolver<K, V> + 'static,
    {
        let mut caches = self.write();
        if caches.contains_key(name) {
            return Err(CacheError::DuplicateCache { name: name.into() });
        }
        let cache = RingCache::open(name, resolver, config)?;
        caches.insert(name.to_string(), cache.clone());
        Ok(cache)
    }

    /// Looks up a cache by name. An unknown name is a caller error and is
    /// surfaced immediately.
    pub fn get(&self, name: &str) -> Result<RingCache<K, V>, CacheError> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::UnknownCache { name: name.into() })
    }

    /// Returns `true` if a cache is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Shuts down the named cache and removes it from the registry.
    pub async fn close(&self, name: &str) -> Result<(), CacheError> {
        let cache = self
            .write()
            .remove(name)
            .ok_or_else(|| CacheError::UnknownCache { name: name.into() })?;
        cache.shutdown().await;
        Ok(())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, RingCache<K, V>>> {
        self.caches.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, RingCache<K, V>>> {
        self.caches.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NullResolver;

    #[tokio::test]
    async fn test_open_get_close_round_trip() {
        let registry: Registry<String, String> = Registry::new();
        registry
            .open("users", NullResolver, CacheConfig::default())
            .unwrap();

        assert!(registry.contains("users"));
        assert_eq!(registry.get("users").unwrap().name(), "users");

        registry.close("users").await.unwrap();
        assert!(!registry.contains("users"));
    }

    #[tokio::test]
    async fn test_unknown_name_is_an_error() {
        let registry: Registry<String, String> = Registry::new();
        assert!(matches!(
            registry.get("missing").unwrap_err(),
            CacheError::UnknownCache { .. }
        ));
        assert!(matches!(
            registry.close("missing").await.unwrap_err(),
            CacheError::UnknownCache { .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let registry: Registry<String, String> = Registry::new();
        registry
            .open("users", NullResolver, CacheConfig::default())
            .unwrap();
        assert!(matches!(
            registry
                .open("users", NullResolver, CacheConfig::default())
                .unwrap_err(),
            CacheError::DuplicateCache { .. }
        ));
        registry.close("users").await.unwrap();
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let registry: Registry<String, String> = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .open(name, NullResolver, CacheConfig::default())
                .unwrap();
        }
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
        for name in ["zeta", "alpha", "mid"] {
            registry.close(name).await.unwrap();
        }
    }
}
