//! The cache handle: coordinated lookup, batched resolution, and the
//! administrative command surface.

use crate::actor::{self, Command, ShutdownState};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::resolver::{ResolveError, Resolver, SharedResolver};
use genring::{Entry, GenerationRing, RingError};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One bucket's contents, as reported by [`RingCache::inspect_contents`].
#[derive(Debug, Clone)]
pub struct BucketContents<K, V> {
    /// The bucket's label.
    pub label: Box<str>,
    /// Every entry the bucket currently holds.
    pub entries: Vec<(K, Entry<V>)>,
}

/// State shared between cache handles and the control task.
pub(crate) struct CacheShared<K, V> {
    pub(crate) name: Box<str>,
    pub(crate) ring: GenerationRing<K, V>,
    resolver: RwLock<SharedResolver<K, V>>,
    pub(crate) shutdown: ShutdownState,
}

impl<K, V> CacheShared<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Clones out the current resolver handle.
    pub(crate) fn resolver(&self) -> SharedResolver<K, V> {
        Arc::clone(&self.resolver.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the resolver. Called only by the control task.
    pub(crate) fn swap_resolver(&self, resolver: SharedResolver<K, V>) {
        *self.resolver.write().unwrap_or_else(PoisonError::into_inner) = resolver;
    }

    /// Per-bucket listings, newest→oldest.
    pub(crate) fn contents(&self) -> Vec<BucketContents<K, V>> {
        self.ring
            .iter_newest_to_oldest()
            .map(|bucket| BucketContents {
                label: bucket.label().into(),
                entries: bucket.snapshot(),
            })
            .collect()
    }
}

/// A generationally-expiring key/value cache.
///
/// Entries live in a ring of generation buckets; a periodic rotation clears
/// the oldest bucket, so every entry is resident for at least one and at
/// most `bucket_count` rotation periods. Keys the cache does not hold are
/// resolved in batch by the configured [`Resolver`]; keys the resolver
/// reports as nonexistent become negative entries, cached for the same
/// lifetime as any other.
///
/// The handle is cheap to clone; all clones address the same cache.
/// Lookups read buckets directly and await only resolver execution.
/// Administrative mutations ([`insert`](Self::insert),
/// [`delete`](Self::delete), [`clear`](Self::clear),
/// [`set_resolver`](Self::set_resolver)) are fire-and-forget messages to the
/// cache's control task and are applied in enqueue order; a lookup issued
/// immediately after one of them may still observe the previous state.
///
/// # Example
///
/// ```ignore
/// use ringcache::{resolver_fn, CacheConfig, RingCache};
///
/// let resolver = resolver_fn(|keys: Vec<String>| async move {
///     Ok(keys.into_iter().map(|k| {
///         let v = format!("v:{k}");
///         (k, Some(v))
///     }).collect())
/// });
/// let cache = RingCache::open("users", resolver, CacheConfig::default())?;
///
/// assert_eq!(cache.get("alice".to_string()).await?, Some("v:alice".to_string()));
/// cache.shutdown().await;
/// ```
pub struct RingCache<K, V> {
    shared: Arc<CacheShared<K, V>>,
    tx: mpsc::UnboundedSender<Command<K, V>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<K, V> std::fmt::Debug for RingCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingCache").finish_non_exhaustive()
    }
}

impl<K, V> Clone for RingCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            tx: self.tx.clone(),
            task: Arc::clone(&self.task),
        }
    }
}

impl<K, V> RingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Opens a cache named `name` with the given resolver and configuration,
    /// spawning its control task on the current tokio runtime.
    ///
    /// The name namespaces the cache: bucket labels derive from it, and two
    /// caches opened under distinct names share no storage.
    pub fn open<R>(name: &str, resolver: R, config: CacheConfig) -> Result<Self, CacheError>
    where
        R: Resolver<K, V> + 'static,
    {
        config.validate()?;
        let ring = GenerationRing::new(name, config.bucket_count).map_err(|err| match err {
            RingError::ZeroBuckets => CacheError::ZeroBuckets,
        })?;

        let resolver: SharedResolver<K, V> = Arc::new(resolver);
        let shared = Arc::new(CacheShared {
            name: name.into(),
            ring,
            resolver: RwLock::new(resolver),
            shutdown: ShutdownState::default(),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(actor::run(
            Arc::clone(&shared),
            rx,
            config.generation_period,
        ));

        Ok(Self {
            shared,
            tx,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// The cache's name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    // ---------------------------------------------------------------------
    // LOOKUP PATH
    // ---------------------------------------------------------------------

    /// Resolves a single key.
    ///
    /// `Ok(None)` means the resolver reported no value for the key: a
    /// negative result, cached like any other. A plain miss never surfaces
    /// as an error; it triggers resolution.
    pub async fn get(&self, key: K) -> Result<Option<V>, CacheError> {
        let (_, value) = self.get_tuple(key).await?;
        Ok(value)
    }

    /// Like [`get`](Self::get), but hands the key back alongside the value.
    pub async fn get_tuple(&self, key: K) -> Result<(K, Option<V>), CacheError> {
        let mut resolved = self.get_many(vec![key.clone()]).await?;
        let value = resolved.remove(&key).flatten();
        Ok((key, value))
    }

    /// Resolves a batch of keys, preserving the per-key association.
    ///
    /// Keys found in the ring are returned without consulting the resolver;
    /// only the residual misses form the resolver batch. A key the resolver
    /// chose not to answer for is absent from the result map (and stays
    /// uncached), which is distinct from a present key mapped to `None` (a
    /// negative result).
    pub async fn get_many(&self, keys: Vec<K>) -> Result<HashMap<K, Option<V>>, CacheError> {
        if self.shared.shutdown.is_closed() {
            return Err(CacheError::ShutDown);
        }

        let mut resolved: HashMap<K, Option<V>> = HashMap::with_capacity(keys.len());
        let mut hits: Vec<(K, Entry<V>)> = Vec::new();
        let mut unresolved = keys;

        // Walk newest→oldest; the first bucket holding a key wins, so the
        // freshest copy is the one returned.
        for bucket in self.shared.ring.iter_newest_to_oldest() {
            if unresolved.is_empty() {
                break;
            }
            unresolved = bucket.partition(unresolved, &mut hits);
        }
        for (key, entry) in hits {
            resolved.insert(key, entry.into_option());
        }
        if unresolved.is_empty() {
            return Ok(resolved);
        }

        // Resolve the residual misses with no locks held. The resolver runs
        // here, in the caller's task, never on the control task.
        let resolver = self.shared.resolver();
        let pairs = match resolver.resolve_boxed(unresolved).await {
            Ok(pairs) => pairs,
            Err(err) => {
                if matches!(err, ResolveError::MalformedResult(_)) {
                    tracing::warn!(
                        cache = %self.shared.name,
                        error = %err,
                        "resolver returned a malformed result"
                    );
                }
                return Err(err.into());
            }
        };

        // Install into the newest bucket from this task, so a sequential
        // re-lookup sees the result. Concurrent resolvers of the same key
        // serialize on the bucket lock; last writer wins. A rotation racing
        // this install can at worst age the entry one generation early.
        let entries: Vec<(K, Entry<V>)> = pairs
            .into_iter()
            .map(|pair| (pair.key, Entry::from(pair.value)))
            .collect();
        self.shared.ring.newest().insert_many(entries.clone());

        for (key, entry) in entries {
            resolved.insert(key, entry.into_option());
        }
        Ok(resolved)
    }

    /// Batched lookup returning `(key, value)` tuples in input order.
    ///
    /// Keys the resolver declined to answer for are omitted.
    pub async fn get_many_tuples(
        &self,
        keys: Vec<K>,
    ) -> Result<Vec<(K, Option<V>)>, CacheError> {
        let mut resolved = self.get_many(keys.clone()).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| resolved.remove(&key).map(|value| (key, value)))
            .collect())
    }

    // ---------------------------------------------------------------------
    // ADMINISTRATIVE SURFACE (fire-and-forget, applied in enqueue order)
    // ---------------------------------------------------------------------

    /// Installs `pairs` into the newest bucket.
    pub fn insert(&self, pairs: Vec<(K, V)>) -> Result<(), CacheError> {
        let entries = pairs
            .into_iter()
            .map(|(key, value)| (key, Entry::Present(value)))
            .collect();
        self.send(Command::Insert(entries))
    }

    /// Removes `key` from every bucket.
    pub fn delete(&self, key: K) -> Result<(), CacheError> {
        self.send(Command::Delete(key))
    }

    /// Empties every bucket; ring positions are untouched.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.send(Command::Clear)
    }

    /// Replaces the resolver for subsequent misses. Entries resolved by the
    /// previous resolver remain until they age out.
    pub fn set_resolver<R>(&self, resolver: R) -> Result<(), CacheError>
    where
        R: Resolver<K, V> + 'static,
    {
        let resolver: SharedResolver<K, V> = Arc::new(resolver);
        self.send(Command::SetResolver(resolver))
    }

    /// The resolver currently in use. Synchronous: reads the shared handle
    /// without a round-trip through the control task.
    pub fn get_resolver(&self) -> SharedResolver<K, V> {
        self.shared.resolver()
    }

    // ---------------------------------------------------------------------
    // INSPECTION (round-trips through the control task; also useful as an
    // ordering barrier after fire-and-forget commands)
    // ---------------------------------------------------------------------

    /// Bucket labels in newest→oldest order.
    pub async fn inspect_order(&self) -> Result<Vec<Box<str>>, CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::InspectOrder(reply_tx))?;
        reply_rx.await.map_err(|_| CacheError::ShutDown)
    }

    /// Per-bucket listings in newest→oldest order.
    pub async fn inspect_contents(&self) -> Result<Vec<BucketContents<K, V>>, CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::InspectContents(reply_tx))?;
        reply_rx.await.map_err(|_| CacheError::ShutDown)
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Returns `true` once shutdown has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.is_closed()
    }

    /// Shuts the cache down: the control task applies every command already
    /// enqueued, the expiry timer stops, and bucket storage is released when
    /// the last handle drops. Idempotent; later calls are no-ops.
    pub async fn shutdown(&self) {
        if self.shared.shutdown.close() {
            let (ack_tx, ack_rx) = oneshot::channel();
            if self.tx.send(Command::Shutdown(ack_tx)).is_ok() {
                let _ = ack_rx.await;
            }
        }
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn send(&self, cmd: Command<K, V>) -> Result<(), CacheError> {
        if self.shared.shutdown.is_closed() {
            return Err(CacheError::ShutDown);
        }
        self.tx.send(cmd).map_err(|_| CacheError::ShutDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolver_fn, NullResolver};

    fn echo_cache(name: &str) -> RingCache<String, String> {
        let resolver = resolver_fn(|keys: Vec<String>| async move {
            Ok(keys
                .into_iter()
                .map(|k| {
                    let v = format!("v:{k}");
                    (k, Some(v))
                })
                .collect::<Vec<_>>())
        });
        RingCache::open(name, resolver, CacheConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_open_rejects_bad_config() {
        let err = RingCache::<String, String>::open(
            "bad",
            NullResolver,
            CacheConfig::default().with_bucket_count(0),
        )
        .unwrap_err();
        assert!(matches!(err, CacheError::ZeroBuckets));
    }

    #[tokio::test]
    async fn test_resolved_value_lands_in_newest_bucket() {
        let cache = echo_cache("t");
        cache.get("a".to_string()).await.unwrap();

        let contents = cache.inspect_contents().await.unwrap();
        assert_eq!(contents[0].label.as_ref(), "t/0");
        assert_eq!(
            contents[0].entries,
            vec![("a".to_string(), Entry::Present("v:a".to_string()))]
        );
        assert!(contents[1..].iter().all(|b| b.entries.is_empty()));

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_handles_are_clones_of_one_cache() {
        let cache = echo_cache("t");
        let other = cache.clone();

        cache.insert(vec![("k".into(), "v".into())]).unwrap();
        other.inspect_order().await.unwrap(); // barrier
        assert_eq!(other.get("k".to_string()).await.unwrap(), Some("v".into()));

        cache.shutdown().await;
        assert!(other.is_shutdown());
    }

    #[tokio::test]
    async fn test_operations_fail_after_shutdown() {
        let cache = echo_cache("t");
        cache.shutdown().await;
        cache.shutdown().await; // idempotent

        assert!(matches!(
            cache.get("a".to_string()).await.unwrap_err(),
            CacheError::ShutDown
        ));
        assert!(matches!(
            cache.insert(vec![("k".into(), "v".into())]).unwrap_err(),
            CacheError::ShutDown
        ));
        assert!(matches!(
            cache.inspect_order().await.unwrap_err(),
            CacheError::ShutDown
        ));
    }

    #[tokio::test]
    async fn test_get_resolver_is_live() {
        let cache: RingCache<String, String> =
            RingCache::open("t", NullResolver, CacheConfig::default()).unwrap();

        let before = cache.get_resolver();
        assert!(before.resolve_boxed(vec!["a".into()]).await.unwrap().is_empty());

        cache
            .set_resolver(resolver_fn(|keys: Vec<String>| async move {
                Ok(keys.into_iter().map(|k| (k, Some("x".to_string()))).collect::<Vec<_>>())
            }))
            .unwrap();
        cache.inspect_order().await.unwrap(); // barrier

        let after = cache.get_resolver();
        assert_eq!(
            after.resolve_boxed(vec!["a".into()]).await.unwrap().len(),
            1
        );

        cache.shutdown().await;
    }
}
