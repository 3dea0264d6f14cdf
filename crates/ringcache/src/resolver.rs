//! The resolver contract: batch keys in, key/value pairs out.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors a resolver can signal.
///
/// Negative results are *not* errors: a resolver that knows a key has no
/// value returns a pair with `value: None`. Errors mean the batch as a whole
/// failed and nothing from it should be cached.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The backing source failed (I/O, upstream outage, timeout).
    #[error("resolver failed: {0}")]
    Failed(String),

    /// The resolver produced a result it could not shape into key/value
    /// pairs (e.g. a malformed upstream payload).
    #[error("malformed resolver result: {0}")]
    MalformedResult(String),
}

/// One resolved pair: a key and its value, where `None` means the source
/// confirmed no value exists (a negative result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair<K, V> {
    pub key: K,
    pub value: Option<V>,
}

impl<K, V> From<(K, Option<V>)> for ResolvedPair<K, V> {
    fn from((key, value): (K, Option<V>)) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for ResolvedPair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }
}

/// Resolves a batch of keys against some backing source.
///
/// The resolver is invoked only for keys the cache does not hold, with the
/// residual miss set as a single batch. It may return fewer pairs than it was
/// asked for (those keys stay uncached) or more (extra pairs are cached too).
///
/// # Note on Object Safety
///
/// This trait uses an `impl Future` return type and is not object-safe. The
/// cache stores resolvers as [`ResolverBoxed`] trait objects; the blanket
/// impl below converts automatically, so implementors only ever write this
/// trait.
pub trait Resolver<K, V>: Send + Sync {
    /// Resolves `keys`, returning a pair per key the source knows about.
    fn resolve(
        &self,
        keys: Vec<K>,
    ) -> impl Future<Output = Result<Vec<ResolvedPair<K, V>>, ResolveError>> + Send;
}

/// Object-safe version of [`Resolver`] for dynamic dispatch.
///
/// The cache holds `Arc<dyn ResolverBoxed>` so the resolver can be swapped
/// at runtime without restarting the cache.
pub trait ResolverBoxed<K, V>: Send + Sync {
    /// Resolves `keys` (boxed future for object safety).
    fn resolve_boxed<'a>(
        &'a self,
        keys: Vec<K>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ResolvedPair<K, V>>, ResolveError>> + Send + 'a>>
    where
        K: 'a,
        V: 'a;
}

/// Blanket implementation: any `Resolver` can be used as `ResolverBoxed`.
impl<K, V, T: Resolver<K, V>> ResolverBoxed<K, V> for T {
    fn resolve_boxed<'a>(
        &'a self,
        keys: Vec<K>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ResolvedPair<K, V>>, ResolveError>> + Send + 'a>>
    where
        K: 'a,
        V: 'a,
    {
        Box::pin(self.resolve(keys))
    }
}

/// A resolver built from a plain async closure.
///
/// Extra arguments the source needs are simply captured by the closure.
pub struct FnResolver<F> {
    f: F,
}

impl<K, V, F, Fut, P> Resolver<K, V> for FnResolver<F>
where
    K: Send + 'static,
    V: Send + 'static,
    F: Fn(Vec<K>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<P>, ResolveError>> + Send,
    P: Into<ResolvedPair<K, V>>,
{
    async fn resolve(&self, keys: Vec<K>) -> Result<Vec<ResolvedPair<K, V>>, ResolveError> {
        let pairs = (self.f)(keys).await?;
        Ok(pairs.into_iter().map(Into::into).collect())
    }
}

/// Wraps an async closure as a [`Resolver`].
///
/// The closure receives the batch of unresolved keys and returns anything
/// convertible into [`ResolvedPair`]s: `(key, value)` for present values,
/// `(key, None)` for negative ones.
///
/// # Example
/// ```ignore
/// let resolver = resolver_fn(|keys: Vec<String>| async move {
///     Ok(keys.into_iter().map(|k| (k.clone(), Some(format!("v:{k}")))).collect())
/// });
/// ```
pub fn resolver_fn<F>(f: F) -> FnResolver<F> {
    FnResolver { f }
}

/// A resolver that resolves nothing: every key is left unresolved.
///
/// Useful for caches populated exclusively through explicit inserts, and for
/// tests that must observe misses.
pub struct NullResolver;

impl<K, V> Resolver<K, V> for NullResolver
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn resolve(&self, _keys: Vec<K>) -> Result<Vec<ResolvedPair<K, V>>, ResolveError> {
        Ok(Vec::new())
    }
}

/// Convenience alias for the shared, swappable resolver handle.
pub type SharedResolver<K, V> = Arc<dyn ResolverBoxed<K, V>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_resolver_normalizes_pair_shapes() {
        // Present-only tuple shape.
        let r = resolver_fn(|keys: Vec<u32>| async move {
            Ok(keys.into_iter().map(|k| (k, k * 10)).collect::<Vec<_>>())
        });
        let pairs = r.resolve(vec![1, 2]).await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ResolvedPair { key: 1, value: Some(10) },
                ResolvedPair { key: 2, value: Some(20) },
            ]
        );

        // Option shape with a negative.
        let r = resolver_fn(|keys: Vec<u32>| async move {
            Ok(keys
                .into_iter()
                .map(|k| (k, if k == 2 { None } else { Some(k) }))
                .collect::<Vec<_>>())
        });
        let pairs: Vec<ResolvedPair<u32, u32>> = r.resolve(vec![1, 2]).await.unwrap();
        assert_eq!(pairs[1], ResolvedPair { key: 2, value: None });
    }

    #[tokio::test]
    async fn test_null_resolver_resolves_nothing() {
        let r = NullResolver;
        let pairs: Vec<ResolvedPair<u32, u32>> = r.resolve(vec![1, 2, 3]).await.unwrap();
        assert!(pairs.is_empty());
    }

    #[tokio::test]
    async fn test_boxed_dispatch_matches_direct_call() {
        let r = resolver_fn(|keys: Vec<u32>| async move {
            Ok(keys.into_iter().map(|k| (k, k + 1)).collect::<Vec<_>>())
        });
        let boxed: SharedResolver<u32, u32> = Arc::new(r);
        let pairs = boxed.resolve_boxed(vec![9]).await.unwrap();
        assert_eq!(pairs, vec![ResolvedPair { key: 9, value: Some(10) }]);
    }

    #[tokio::test]
    async fn test_errors_carry_context() {
        let r = resolver_fn(|_keys: Vec<u32>| async move {
            Err::<Vec<(u32, u32)>, _>(ResolveError::Failed("backend down".into()))
        });
        let err = r.resolve(vec![1]).await.unwrap_err();
        assert!(err.to_string().contains("backend down"));
    }
}
