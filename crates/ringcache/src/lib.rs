//! Generationally-expiring key/value cache with batched resolution.
//!
//! A [`RingCache`] keeps entries in a fixed ring of generation buckets
//! (see [`genring`]) and resolves misses through a caller-supplied
//! [`Resolver`] that takes a whole batch of keys at once. A periodic
//! rotation expires the oldest generation, so every entry (including
//! *negative* entries recording a confirmed absence) lives for at least one
//! and at most `bucket_count` rotation periods. No timers, no timestamps,
//! no per-entry bookkeeping.
//!
//! # Features
//!
//! - **Bounded lifetime**: resident at least `P`, at most `N·P`, enforced by
//!   ring rotation alone
//! - **Batched resolution**: one resolver call covers every miss in a
//!   [`get_many`](RingCache::get_many) batch
//! - **Negative caching**: "no such value" is a first-class entry, not a
//!   repeated miss
//! - **Actor-serialized mutation**: inserts, deletes, clears, resolver swaps
//!   and rotations apply in enqueue order on one control task; lookups never
//!   wait on it
//! - **Named caches**: an optional [`Registry`] maps names to handles
//!
//! # Example
//!
//! ```ignore
//! use ringcache::{resolver_fn, CacheConfig, RingCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ringcache::CacheError> {
//!     let resolver = resolver_fn(|keys: Vec<u64>| async move {
//!         // One round-trip to the backing store for the whole batch.
//!         Ok(keys.into_iter().map(|k| (k, Some(k * 2))).collect())
//!     });
//!     let cache = RingCache::open("doubles", resolver, CacheConfig::default())?;
//!
//!     assert_eq!(cache.get(21).await?, Some(42));      // resolver ran
//!     assert_eq!(cache.get(21).await?, Some(42));      // cache hit
//!     cache.shutdown().await;
//!     Ok(())
//! }
//! ```

mod actor;
mod cache;
mod config;
mod driver;
mod error;
mod registry;
mod resolver;

pub use cache::{BucketContents, RingCache};
pub use config::{CacheConfig, DEFAULT_BUCKET_COUNT, DEFAULT_GENERATION_PERIOD};
pub use error::CacheError;
pub use registry::Registry;
pub use resolver::{
    resolver_fn, FnResolver, NullResolver, ResolveError, ResolvedPair, Resolver, ResolverBoxed,
    SharedResolver,
};

// Re-export the entry type lookups and inspection report in.
pub use genring::Entry;
